//! Durable caches that let a build skip work whose inputs have not changed.
//!
//! The [`CompileCache`] records, per source file, the content hash and
//! modification time it was last seen with, the compile flags used, and the
//! parsed declarations. The [`SetupCache`] records the same kind of
//! information for trusted setups of compiled circuits.
//!
//! Both caches are stored as versioned JSON files. Reading is fail-safe: a
//! missing, malformed, or version-mismatched file yields an empty cache and
//! a full rebuild, never an error.

#![warn(missing_docs)]

pub mod compile;
pub mod error;
pub mod setup;
mod store;

pub use circa_common::{CompileFlags, SetupSettings};
pub use compile::{CompileCache, CompileCacheEntry, COMPILE_CACHE_FILE, COMPILE_CACHE_FORMAT};
pub use error::CacheError;
pub use setup::{SetupCache, SetupCacheEntry, SETUP_CACHE_FILE, SETUP_CACHE_FORMAT};
