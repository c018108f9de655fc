//! Shared foundational types used across the circa build driver.
//!
//! This crate provides the content fingerprint used as the cache key component,
//! the logical [`SourceName`] that identifies a circuit file independently of
//! where it lives on disk, the build settings recorded in cache entries, and
//! small filesystem time helpers.

#![warn(missing_docs)]

pub mod hash;
pub mod settings;
pub mod source_name;
pub mod time;

pub use hash::{ContentHash, ParseHashError};
pub use settings::{CompileFlags, ProvingSystem, SetupSettings};
pub use source_name::SourceName;
pub use time::modification_millis;
