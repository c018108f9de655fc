//! Error types for parsing circuit files.

use std::path::PathBuf;

use circa_diagnostics::Diagnostic;

/// Errors produced by the [`FileParser`](crate::FileParser).
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The grammar collaborator rejected the file. Carries every diagnostic it
    /// reported.
    #[error("failed to parse {}: {} error(s)", path.display(), diagnostics.len())]
    Syntax {
        /// The file that failed to parse.
        path: PathBuf,
        /// All diagnostics reported for the file.
        diagnostics: Vec<Diagnostic>,
    },

    /// The file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A template was requested that the file does not declare.
    #[error("{} does not declare template `{template}`", path.display())]
    UnknownTemplate {
        /// The file that was searched.
        path: PathBuf,
        /// The requested template name.
        template: String,
    },
}
