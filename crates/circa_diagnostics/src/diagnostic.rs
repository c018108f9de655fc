//! Structured diagnostic messages with severity, position, and notes.

use crate::location::Location;
use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic reported by the grammar collaborator.
///
/// Each diagnostic carries a severity, a message, and the position in the
/// source file where the problem was detected, when one is known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The main diagnostic message.
    pub message: String,
    /// Where the problem was detected.
    pub location: Option<Location>,
    /// Explanatory footnotes (e.g., "note: ...").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new error diagnostic at the given location.
    pub fn error(message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: Some(location),
            notes: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic at the given location.
    pub fn warning(message: impl Into<String>, location: Location) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            location: Some(location),
            notes: Vec::new(),
        }
    }

    /// Creates an error diagnostic that is not tied to a position.
    pub fn general(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            location: None,
            notes: Vec::new(),
        }
    }

    /// Adds a note to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error() {
        let diag = Diagnostic::error("unexpected token", Location::new(3, 7));
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "unexpected token");
        assert_eq!(diag.location, Some(Location::new(3, 7)));
    }

    #[test]
    fn create_warning() {
        let diag = Diagnostic::warning("unused template", Location::new(1, 1));
        assert_eq!(diag.severity, Severity::Warning);
    }

    #[test]
    fn builder_methods() {
        let diag = Diagnostic::general("main component missing")
            .with_note("a circuit needs `component main`");
        assert!(diag.location.is_none());
        assert_eq!(diag.notes.len(), 1);
    }

    #[test]
    fn serde_roundtrip() {
        let diag = Diagnostic::error("expected ';'", Location::new(2, 14));
        let json = serde_json::to_string(&diag).unwrap();
        let back: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(diag, back);
    }
}
