//! Circuit source files: resolution of include specifiers and the data model
//! shared by the parser, the compile cache, and the dependency graph.
//!
//! The [`FileResolver`] maps an include string written inside a circuit file to
//! a [`ResolvedFile`] with a canonical absolute path, a logical
//! [`SourceName`](circa_common::SourceName), the file's modification time, and
//! its content hash. Parsed declarations ([`ResolvedFileData`]) are attached to
//! a resolved file lazily, once the parser has produced them.

#![warn(missing_docs)]

pub mod error;
pub mod file_data;
pub mod resolved_file;
pub mod resolver;

pub use error::ResolveError;
pub use file_data::{
    MainComponentInfo, PragmaInfo, ResolvedFileData, ResolvedMainComponent, SignalInfo,
    TemplateInfo,
};
pub use resolved_file::{LibraryInfo, ResolvedFile};
pub use resolver::{FileResolver, ImportResolver};
