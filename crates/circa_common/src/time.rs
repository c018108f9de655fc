//! Filesystem timestamp helpers.

use std::fs::Metadata;
use std::time::UNIX_EPOCH;

/// Returns the modification time of a file as milliseconds since the Unix epoch.
///
/// Platforms that cannot report a modification time, or report one before the
/// epoch, yield `0`.
pub fn modification_millis(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_file_has_nonzero_mtime() {
        let dir = std::env::temp_dir();
        let metadata = std::fs::metadata(dir).unwrap();
        assert!(modification_millis(&metadata) > 0);
    }
}
