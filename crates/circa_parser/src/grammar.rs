//! The grammar collaborator interface.

use std::path::Path;

use circa_diagnostics::Diagnostic;
use circa_source::{ResolvedFileData, SignalInfo};

/// Extracts declarations from circuit source text.
///
/// Implementations report every problem they find, not just the first.
pub trait GrammarParser: Send + Sync {
    /// Parses `content` into the declarations the build needs.
    fn parse(&self, content: &str, path: &Path) -> Result<ResolvedFileData, Vec<Diagnostic>>;

    /// Resolves the input signals of `template` with its parameters bound to
    /// `parameter_values`, in declaration order.
    fn template_inputs(
        &self,
        content: &str,
        path: &Path,
        template: &str,
        parameter_values: &[i64],
    ) -> Result<Vec<SignalInfo>, Vec<Diagnostic>>;
}
