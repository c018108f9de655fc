//! Per-scan diagnostic collection.

use std::cell::{Cell, RefCell};

use crate::diagnostic::Diagnostic;
use crate::severity::Severity;

/// Collects the diagnostics of one scan of one file.
///
/// The lexer and the declaration scanner share a reference and push into it
/// as they go, so a scan reports every problem rather than stopping at the
/// first. The caller drains it with [`into_diagnostics`](Self::into_diagnostics).
/// Files scanned in parallel each get their own sink.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
    has_errors: Cell<bool>,
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity == Severity::Error {
            self.has_errors.set(true);
        }
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Returns `true` once an error-severity diagnostic has been recorded.
    pub fn has_errors(&self) -> bool {
        self.has_errors.get()
    }

    /// Number of diagnostics recorded so far.
    pub fn len(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.borrow().is_empty()
    }

    /// Consumes the sink, returning diagnostics in emission order.
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics.into_inner()
    }
}
