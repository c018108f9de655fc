//! The compile cache: per-file parse and compile state across runs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use circa_common::{modification_millis, CompileFlags, ContentHash, SourceName};
use circa_source::{ResolvedFile, ResolvedFileData};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::CacheError;
use crate::store;

/// Default name of the compile cache file within the cache directory.
pub const COMPILE_CACHE_FILE: &str = "compile-cache.json";

/// Format tag of the compile cache file. Files with any other tag are ignored.
pub const COMPILE_CACHE_FORMAT: &str = "circa-compile-cache-1";

/// Cached state of a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileCacheEntry {
    /// Modification time in epoch milliseconds when the file was cached.
    pub last_modification_ms: u64,
    /// Content hash when the file was cached.
    pub content_hash: ContentHash,
    /// Logical name of the file.
    pub source_name: SourceName,
    /// Canonical absolute path of the file.
    pub absolute_path: PathBuf,
    /// Flags the file was last compiled with.
    pub compile_flags: CompileFlags,
    /// Parsed declarations of the file.
    pub resolved_data: ResolvedFileData,
}

/// Persisted mapping from logical file name to [`CompileCacheEntry`].
///
/// Created once per build run with [`CompileCache::read_from_file`], queried
/// while the dependency graph is built and the compile plan is made, updated
/// after compilation, pruned, and written back with
/// [`CompileCache::write_to_file`].
#[derive(Debug, Clone, Default)]
pub struct CompileCache {
    files: BTreeMap<SourceName, CompileCacheEntry>,
    by_path: HashMap<PathBuf, SourceName>,
}

impl CompileCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up an entry by logical name, then by absolute path.
    pub fn get_entry(&self, name_or_path: &str) -> Option<&CompileCacheEntry> {
        self.files
            .get(name_or_path)
            .or_else(|| self.get_entry_by_path(Path::new(name_or_path)))
    }

    /// Looks up an entry by the absolute path it was cached under.
    pub fn get_entry_by_path(&self, path: &Path) -> Option<&CompileCacheEntry> {
        self.by_path.get(path).and_then(|name| self.files.get(name))
    }

    /// Inserts or replaces the entry for `entry.source_name`.
    pub fn add_file(&mut self, entry: CompileCacheEntry) {
        if let Some(old) = self.files.get(&entry.source_name) {
            if old.absolute_path != entry.absolute_path {
                self.by_path.remove(&old.absolute_path);
            }
        }
        if let Some(other) = self.by_path.get(&entry.absolute_path) {
            if *other != entry.source_name {
                let other = other.clone();
                self.files.remove(&other);
            }
        }
        trace!(file = %entry.source_name, hash = %entry.content_hash, "cache entry updated");
        self.by_path
            .insert(entry.absolute_path.clone(), entry.source_name.clone());
        self.files.insert(entry.source_name.clone(), entry);
    }

    /// Records a resolved file as compiled with `flags`.
    ///
    /// Returns `false` and leaves the cache untouched if the file has no
    /// parsed data attached.
    pub fn record(&mut self, file: &ResolvedFile, flags: CompileFlags) -> bool {
        let Some(data) = file.data() else {
            return false;
        };
        self.add_file(CompileCacheEntry {
            last_modification_ms: file.last_modification_ms(),
            content_hash: file.content_hash(),
            source_name: file.source_name().clone(),
            absolute_path: file.absolute_path().to_path_buf(),
            compile_flags: flags,
            resolved_data: ResolvedFileData::clone(data),
        });
        true
    }

    /// Returns `true` if the file at `path` must be treated as changed.
    ///
    /// A file is changed when it has no entry, when its content hash differs
    /// from the cached one, or when its current modification time differs
    /// from the cached one (including when it can no longer be stat'ed).
    pub fn has_file_changed(&self, path: &Path, content_hash: ContentHash) -> bool {
        let Some(entry) = self.get_entry_by_path(path) else {
            return true;
        };
        if entry.content_hash != content_hash {
            return true;
        }
        match std::fs::metadata(path) {
            Ok(metadata) => !self.is_unmodified_since(path, modification_millis(&metadata)),
            Err(_) => true,
        }
    }

    /// Returns `true` if `path` is cached with exactly `last_modification_ms`.
    ///
    /// Only metadata is compared; a `false` result says nothing about the
    /// content, which must then be hashed.
    pub fn is_unmodified_since(&self, path: &Path, last_modification_ms: u64) -> bool {
        self.get_entry_by_path(path)
            .is_some_and(|entry| entry.last_modification_ms == last_modification_ms)
    }

    /// Cached `(path, modification time, content hash)` of every entry.
    ///
    /// Handed to [`FileResolver::with_known_hashes`](circa_source::FileResolver::with_known_hashes)
    /// so files untouched since the last run are not read again.
    pub fn fingerprints(&self) -> impl Iterator<Item = (PathBuf, u64, ContentHash)> + '_ {
        self.files.values().map(|entry| {
            (
                entry.absolute_path.clone(),
                entry.last_modification_ms,
                entry.content_hash,
            )
        })
    }

    /// Returns `true` if the file at `path` has no entry or was cached with
    /// different flags.
    pub fn has_flags_changed(&self, path: &Path, flags: CompileFlags) -> bool {
        self.get_entry_by_path(path)
            .map_or(true, |entry| entry.compile_flags != flags)
    }

    /// Removes every entry whose absolute path is not in `paths`.
    ///
    /// Returns the number of entries removed.
    pub fn remove_entries_not_in_files<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let keep: HashSet<PathBuf> = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        let before = self.files.len();
        self.files
            .retain(|_, entry| keep.contains(&entry.absolute_path));
        self.by_path.retain(|path, _| keep.contains(path));
        let removed = before - self.files.len();
        if removed > 0 {
            debug!(removed, "pruned stale cache entries");
        }
        removed
    }

    /// Iterates over all entries in logical-name order.
    pub fn entries(&self) -> impl Iterator<Item = (&SourceName, &CompileCacheEntry)> {
        self.files.iter()
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Writes the cache to `path`, creating parent directories as needed.
    pub fn write_to_file(&self, path: &Path) -> Result<(), CacheError> {
        store::write_entries(path, COMPILE_CACHE_FORMAT, &self.files)
    }

    /// Reads a cache from `path`.
    ///
    /// A missing, malformed, or version-mismatched file yields an empty cache.
    pub fn read_from_file(path: &Path) -> Self {
        let files: BTreeMap<SourceName, CompileCacheEntry> =
            store::load_or_empty(path, COMPILE_CACHE_FORMAT);
        let by_path = files
            .iter()
            .map(|(name, entry)| (entry.absolute_path.clone(), name.clone()))
            .collect();
        Self { files, by_path }
    }
}
