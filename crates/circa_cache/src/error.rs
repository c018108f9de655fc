//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Reading a cache is fail-safe: `Corrupted` and `VersionMismatch` are only
/// produced internally and recovered by starting from an empty cache. Writing
/// a cache reports `Io` and `Serialization` failures to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing a cache file.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// A cache file exists but could not be parsed.
    #[error("corrupted cache file {path}: {reason}")]
    Corrupted {
        /// The cache file path.
        path: PathBuf,
        /// Description of the parse failure.
        reason: String,
    },

    /// A cache file was written by an incompatible format version.
    #[error("version mismatch in {path}: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The cache file path.
        path: PathBuf,
        /// The format tag this build reads and writes.
        expected: String,
        /// The format tag found in the file.
        actual: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display() {
        let err = CacheError::Io {
            path: PathBuf::from("/tmp/cache/compile-cache.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("cache I/O error"));
        assert!(msg.contains("compile-cache.json"));
    }

    #[test]
    fn corrupted_display() {
        let err = CacheError::Corrupted {
            path: PathBuf::from("cache.json"),
            reason: "EOF while parsing".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("corrupted cache file"));
        assert!(msg.contains("EOF while parsing"));
    }

    #[test]
    fn version_mismatch_display() {
        let err = CacheError::VersionMismatch {
            path: PathBuf::from("cache.json"),
            expected: "circa-compile-cache-1".to_string(),
            actual: "circa-compile-cache-0".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected circa-compile-cache-1"));
        assert!(msg.contains("got circa-compile-cache-0"));
    }
}
