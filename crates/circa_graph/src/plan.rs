//! Deciding which circuits must be recompiled.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use circa_cache::CompileCache;
use circa_common::{CompileFlags, SourceName};
use circa_source::ResolvedFile;
use tracing::debug;

use crate::graph::DependencyGraph;

/// Why a circuit must be recompiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// The circuit has never been compiled.
    NotCached,
    /// The circuit's own source changed.
    Changed,
    /// A file the circuit includes, directly or transitively, changed.
    DependencyChanged(SourceName),
    /// The circuit was compiled with different flags.
    FlagsChanged,
    /// Recompilation was requested unconditionally.
    Forced,
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NotCached => write!(f, "not compiled yet"),
            StaleReason::Changed => write!(f, "source changed"),
            StaleReason::DependencyChanged(name) => write!(f, "dependency `{name}` changed"),
            StaleReason::FlagsChanged => write!(f, "compile flags changed"),
            StaleReason::Forced => write!(f, "forced"),
        }
    }
}

/// The circuits of a graph split into stale and fresh.
///
/// Only files whose parsed data declares a main component are circuits;
/// other files are libraries of templates and are never compiled on their
/// own.
#[derive(Debug, Default)]
pub struct CompilePlan {
    stale: Vec<(Arc<ResolvedFile>, StaleReason)>,
    fresh: Vec<Arc<ResolvedFile>>,
}

impl CompilePlan {
    /// Classifies every circuit in `graph` against `cache`.
    pub fn new(graph: &DependencyGraph, cache: &CompileCache, flags: CompileFlags) -> Self {
        Self::build(graph, cache, flags, false)
    }

    /// Like [`CompilePlan::new`], but marks every circuit stale.
    pub fn forced(graph: &DependencyGraph, cache: &CompileCache, flags: CompileFlags) -> Self {
        Self::build(graph, cache, flags, true)
    }

    fn build(graph: &DependencyGraph, cache: &CompileCache, flags: CompileFlags, force: bool) -> Self {
        let mut changed: HashMap<SourceName, bool> = HashMap::new();
        let mut is_changed = |file: &Arc<ResolvedFile>| -> bool {
            *changed
                .entry(file.source_name().clone())
                .or_insert_with(|| cache.has_file_changed(file.absolute_path(), file.content_hash()))
        };

        let mut plan = Self::default();
        for file in graph.resolved_files() {
            if !file.data().is_some_and(|d| d.has_main_component()) {
                continue;
            }
            let reason = if force {
                Some(StaleReason::Forced)
            } else if cache.get_entry_by_path(file.absolute_path()).is_none() {
                Some(StaleReason::NotCached)
            } else if is_changed(file) {
                Some(StaleReason::Changed)
            } else if cache.has_flags_changed(file.absolute_path(), flags) {
                Some(StaleReason::FlagsChanged)
            } else {
                let mut deps = graph.transitive_dependencies(file);
                deps.sort_by(|a, b| a.dependency.source_name().cmp(b.dependency.source_name()));
                deps.into_iter()
                    .find(|t| is_changed(&t.dependency))
                    .map(|t| StaleReason::DependencyChanged(t.dependency.source_name().clone()))
            };
            match reason {
                Some(reason) => {
                    debug!(circuit = %file.source_name(), %reason, "stale");
                    plan.stale.push((Arc::clone(file), reason));
                }
                None => plan.fresh.push(Arc::clone(file)),
            }
        }
        plan
    }

    /// Circuits that must be recompiled, in source-name order.
    pub fn stale(&self) -> impl Iterator<Item = &Arc<ResolvedFile>> {
        self.stale.iter().map(|(file, _)| file)
    }

    /// Circuits whose cached compilation is still valid, in source-name order.
    pub fn fresh(&self) -> &[Arc<ResolvedFile>] {
        &self.fresh
    }

    /// Why `file` is stale, or `None` if it is fresh or not a circuit.
    pub fn reason(&self, file: &ResolvedFile) -> Option<&StaleReason> {
        self.stale
            .iter()
            .find(|(f, _)| f.source_name() == file.source_name())
            .map(|(_, reason)| reason)
    }

    /// Returns `true` if nothing needs recompiling.
    pub fn is_up_to_date(&self) -> bool {
        self.stale.is_empty()
    }
}
