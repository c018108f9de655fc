//! The setup cache: which compiled circuits already have a trusted setup.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use circa_common::{ContentHash, SetupSettings};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CacheError;
use crate::store;

/// Default name of the setup cache file within the cache directory.
pub const SETUP_CACHE_FILE: &str = "setup-cache.json";

/// Format tag of the setup cache file.
pub const SETUP_CACHE_FORMAT: &str = "circa-setup-cache-1";

/// Cached setup state of one compiled circuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupCacheEntry {
    /// Logical name of the circuit.
    pub circuit_name: String,
    /// Hash of the compiled constraint file the setup was run on.
    pub r1cs_content_hash: ContentHash,
    /// Path of the compiled constraint file.
    pub r1cs_path: PathBuf,
    /// Settings the setup was produced with.
    pub settings: SetupSettings,
}

/// Persisted mapping from circuit name to [`SetupCacheEntry`].
#[derive(Debug, Clone, Default)]
pub struct SetupCache {
    entries: BTreeMap<String, SetupCacheEntry>,
}

impl SetupCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the entry for a circuit.
    pub fn get_entry(&self, circuit_name: &str) -> Option<&SetupCacheEntry> {
        self.entries.get(circuit_name)
    }

    /// Returns `true` unless the circuit has an entry with the same constraint
    /// file hash and settings.
    pub fn has_changed(
        &self,
        circuit_name: &str,
        r1cs_content_hash: ContentHash,
        settings: &SetupSettings,
    ) -> bool {
        self.entries.get(circuit_name).map_or(true, |entry| {
            entry.r1cs_content_hash != r1cs_content_hash || entry.settings != *settings
        })
    }

    /// Inserts or replaces the entry for `entry.circuit_name`.
    pub fn add_entry(&mut self, entry: SetupCacheEntry) {
        self.entries.insert(entry.circuit_name.clone(), entry);
    }

    /// Removes entries for circuits not in `names`. Returns the number removed.
    pub fn remove_entries_not_in<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keep: HashSet<String> = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        let before = self.entries.len();
        self.entries.retain(|name, _| keep.contains(name));
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "pruned stale setup entries");
        }
        removed
    }

    /// Iterates over all entries in circuit-name order.
    pub fn entries(&self) -> impl Iterator<Item = &SetupCacheEntry> {
        self.entries.values()
    }

    /// Number of cached setups.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the cache to `path`, creating parent directories as needed.
    pub fn write_to_file(&self, path: &Path) -> Result<(), CacheError> {
        store::write_entries(path, SETUP_CACHE_FORMAT, &self.entries)
    }

    /// Reads a cache from `path`; unusable files yield an empty cache.
    pub fn read_from_file(path: &Path) -> Self {
        Self {
            entries: store::load_or_empty(path, SETUP_CACHE_FORMAT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circa_common::ProvingSystem;

    fn groth16(contributions: u32) -> SetupSettings {
        SetupSettings {
            proving_system: ProvingSystem::Groth16,
            contribution_count: contributions,
        }
    }

    fn entry(name: &str, r1cs: &[u8]) -> SetupCacheEntry {
        SetupCacheEntry {
            circuit_name: name.to_string(),
            r1cs_content_hash: ContentHash::from_bytes(r1cs),
            r1cs_path: PathBuf::from(format!("build/{name}.r1cs")),
            settings: groth16(1),
        }
    }

    #[test]
    fn has_changed_tracks_hash_and_settings() {
        let mut cache = SetupCache::new();
        assert!(cache.has_changed("main", ContentHash::from_bytes(b"r1cs"), &groth16(1)));

        cache.add_entry(entry("main", b"r1cs"));
        assert!(!cache.has_changed("main", ContentHash::from_bytes(b"r1cs"), &groth16(1)));
        assert!(cache.has_changed("main", ContentHash::from_bytes(b"r1cs v2"), &groth16(1)));
        assert!(cache.has_changed("main", ContentHash::from_bytes(b"r1cs"), &groth16(2)));
        let plonk = SetupSettings {
            proving_system: ProvingSystem::Plonk,
            contribution_count: 1,
        };
        assert!(cache.has_changed("main", ContentHash::from_bytes(b"r1cs"), &plonk));
    }

    #[test]
    fn round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETUP_CACHE_FILE);
        let mut cache = SetupCache::new();
        cache.add_entry(entry("main", b"a"));
        cache.add_entry(entry("transfer", b"b"));
        cache.write_to_file(&path).unwrap();

        let loaded = SetupCache::read_from_file(&path);
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get_entry("transfer"), cache.get_entry("transfer"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["_format"], SETUP_CACHE_FORMAT);
        assert_eq!(raw["files"]["main"]["settings"]["provingSystem"], "groth16");
        assert_eq!(raw["files"]["main"]["settings"]["contributionCount"], 1);
    }

    #[test]
    fn compile_cache_file_is_not_a_setup_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        crate::CompileCache::new().write_to_file(&path).unwrap();
        assert!(SetupCache::read_from_file(&path).is_empty());
    }

    #[test]
    fn prune_by_circuit_name() {
        let mut cache = SetupCache::new();
        cache.add_entry(entry("a", b"a"));
        cache.add_entry(entry("b", b"b"));
        assert_eq!(cache.remove_entries_not_in(["b"]), 1);
        assert!(cache.get_entry("a").is_none());
        assert_eq!(cache.entries().count(), 1);
    }
}
