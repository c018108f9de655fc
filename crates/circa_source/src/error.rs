//! Error types for include resolution.

use std::path::PathBuf;

use circa_common::SourceName;

/// Errors that can occur while mapping an include specifier to a file.
///
/// Resolution errors are never retried; they abort graph construction and are
/// surfaced with the offending specifier and the file that requested it.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The include specifier does not name an existing file.
    #[error("cannot resolve include '{specifier}' from '{requested_by}': file not found")]
    NotFound {
        /// The include string as written in the source.
        specifier: String,
        /// The file containing the include.
        requested_by: SourceName,
    },

    /// The include would resolve outside the root the requesting file lives in.
    #[error("include '{specifier}' from '{requested_by}' escapes source root {}", root.display())]
    EscapesRoot {
        /// The include string as written in the source.
        specifier: String,
        /// The file containing the include.
        requested_by: SourceName,
        /// The project or library root the include must stay within.
        root: PathBuf,
    },

    /// A seed file lies outside the project root.
    #[error("{} is not inside the project root {}", path.display(), root.display())]
    OutsideProject {
        /// The offending path.
        path: PathBuf,
        /// The project root.
        root: PathBuf,
    },

    /// A source name does not correspond to any project or library file.
    #[error("no source file named '{name}'")]
    MissingSource {
        /// The requested source name.
        name: String,
    },

    /// An I/O error occurred while reading file metadata or content.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_specifier_and_requester() {
        let err = ResolveError::NotFound {
            specifier: "base/b.circuit".to_string(),
            requested_by: SourceName::new("base/a.circuit"),
        };
        let msg = err.to_string();
        assert!(msg.contains("'base/b.circuit'"));
        assert!(msg.contains("'base/a.circuit'"));
    }

    #[test]
    fn escapes_root_display() {
        let err = ResolveError::EscapesRoot {
            specifier: "../../etc/passwd".to_string(),
            requested_by: SourceName::new("main.circom"),
            root: PathBuf::from("/project"),
        };
        assert!(err.to_string().contains("escapes source root /project"));
    }

    #[test]
    fn missing_source_display() {
        let err = ResolveError::MissingSource {
            name: "nope.circom".to_string(),
        };
        assert_eq!(err.to_string(), "no source file named 'nope.circom'");
    }
}
