//! Error types for dependency graph construction.

use std::path::PathBuf;

use circa_common::SourceName;
use circa_parser::ParseError;
use circa_source::ResolveError;

/// Errors that abort graph construction.
///
/// Resolution and parse failures propagate unchanged from the file that
/// triggered them. A name conflict comes in two shapes, and both abort the
/// build: [`AmbiguousSourceName`](Self::AmbiguousSourceName) when one path is
/// reached under two names, and [`DuplicateSourceName`](Self::DuplicateSourceName)
/// when two paths claim one name. Callers treating "ambiguous source name" as
/// a single condition should match both. Conflicting names and paths are
/// reported in sorted order, so the same conflict yields the same error
/// regardless of visiting order.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// One file was reached under two logical names.
    #[error("{} is included both as `{first}` and as `{second}`", path.display())]
    AmbiguousSourceName {
        /// The lexicographically smaller name.
        first: SourceName,
        /// The lexicographically larger name.
        second: SourceName,
        /// The shared absolute path.
        path: PathBuf,
    },

    /// Two different files share one logical name.
    #[error(
        "source name `{name}` refers to both {} and {}",
        first_path.display(),
        second_path.display()
    )]
    DuplicateSourceName {
        /// The shared logical name.
        name: SourceName,
        /// The lexicographically smaller path.
        first_path: PathBuf,
        /// The lexicographically larger path.
        second_path: PathBuf,
    },

    /// An include could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A file could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl GraphError {
    pub(crate) fn ambiguous(a: &SourceName, b: &SourceName, path: PathBuf) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        GraphError::AmbiguousSourceName {
            first: first.clone(),
            second: second.clone(),
            path,
        }
    }

    pub(crate) fn duplicate(name: &SourceName, a: PathBuf, b: PathBuf) -> Self {
        let (first_path, second_path) = if a <= b { (a, b) } else { (b, a) };
        GraphError::DuplicateSourceName {
            name: name.clone(),
            first_path,
            second_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_names_sorted() {
        let err = GraphError::ambiguous(
            &SourceName::new("z/b.circom"),
            &SourceName::new("a/b.circom"),
            PathBuf::from("/p/b.circom"),
        );
        assert_eq!(
            err.to_string(),
            "/p/b.circom is included both as `a/b.circom` and as `z/b.circom`"
        );
    }

    #[test]
    fn duplicate_paths_sorted() {
        let err = GraphError::duplicate(
            &SourceName::new("lib/a.circom"),
            PathBuf::from("/y/a.circom"),
            PathBuf::from("/x/a.circom"),
        );
        match err {
            GraphError::DuplicateSourceName {
                first_path,
                second_path,
                ..
            } => {
                assert_eq!(first_path, PathBuf::from("/x/a.circom"));
                assert_eq!(second_path, PathBuf::from("/y/a.circom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
