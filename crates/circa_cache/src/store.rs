//! Versioned JSON persistence shared by the compile and setup caches.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CacheError;

/// On-disk layout: a format tag and a mapping from entry key to entry.
#[derive(Serialize)]
struct CacheFileRef<'a, K, E> {
    #[serde(rename = "_format")]
    format: &'a str,
    files: &'a BTreeMap<K, E>,
}

/// The entries of a file whose format tag has already been checked.
#[derive(Deserialize)]
struct CacheFile<K: Ord, E> {
    files: BTreeMap<K, E>,
}

/// Just the format tag, read before the entries so an old layout is reported
/// as a version mismatch rather than as corruption.
#[derive(Deserialize)]
struct FormatTag {
    #[serde(rename = "_format")]
    format: String,
}

/// Reads the entries of a cache file, failing on any problem.
pub(crate) fn read_entries<K, E>(path: &Path, format: &str) -> Result<BTreeMap<K, E>, CacheError>
where
    K: DeserializeOwned + Ord,
    E: DeserializeOwned,
{
    let content = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tag: FormatTag = serde_json::from_str(&content).map_err(|e| CacheError::Corrupted {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if tag.format != format {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            expected: format.to_string(),
            actual: tag.format,
        });
    }
    let file: CacheFile<K, E> = serde_json::from_str(&content).map_err(|e| CacheError::Corrupted {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(file.files)
}

/// Reads the entries of a cache file, recovering from every failure with an
/// empty map.
pub(crate) fn load_or_empty<K, E>(path: &Path, format: &str) -> BTreeMap<K, E>
where
    K: DeserializeOwned + Ord,
    E: DeserializeOwned,
{
    match read_entries(path, format) {
        Ok(entries) => {
            debug!(path = %path.display(), entries = entries.len(), "loaded cache");
            entries
        }
        Err(CacheError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no cache file, starting empty");
            BTreeMap::new()
        }
        Err(err) => {
            warn!(%err, "discarding unusable cache");
            BTreeMap::new()
        }
    }
}

/// Writes entries under the given format tag, creating parent directories.
pub(crate) fn write_entries<K, E>(
    path: &Path,
    format: &str,
    files: &BTreeMap<K, E>,
) -> Result<(), CacheError>
where
    K: Serialize,
    E: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let file = CacheFileRef { format, files };
    let json = serde_json::to_string_pretty(&file).map_err(|e| CacheError::Serialization {
        reason: e.to_string(),
    })?;
    std::fs::write(path, json).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), entries = file.files.len(), "wrote cache");
    Ok(())
}
