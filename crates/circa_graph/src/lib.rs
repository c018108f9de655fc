//! The include graph of a circuit project and the recompilation plan derived
//! from it.
//!
//! [`DependencyGraph::build`] resolves and parses every file reachable from a
//! set of root files, in parallel. [`CompilePlan`] then compares each circuit
//! and everything it includes against the
//! [`CompileCache`](circa_cache::CompileCache).

#![warn(missing_docs)]

pub mod error;
pub mod graph;
pub mod plan;

pub use error::GraphError;
pub use graph::{DependencyGraph, TransitiveDependency};
pub use plan::{CompilePlan, StaleReason};
