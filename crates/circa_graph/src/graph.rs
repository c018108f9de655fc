//! The include graph of a set of circuit files.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use circa_common::SourceName;
use circa_parser::ParseFile;
use circa_source::{ImportResolver, ResolvedFile};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::GraphError;

/// A file reachable from another, with the files in between.
#[derive(Debug, Clone)]
pub struct TransitiveDependency {
    /// The reachable file.
    pub dependency: Arc<ResolvedFile>,
    /// Intermediate files from the origin (exclusive) to `dependency`
    /// (exclusive). One path is kept per dependency; it is not necessarily
    /// the shortest.
    pub path: Vec<Arc<ResolvedFile>>,
}

/// The include closure of a set of root files.
///
/// Every file reachable from the roots is a key of the graph, and each key
/// maps to its direct includes. The graph is immutable once built.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    files: BTreeMap<SourceName, Arc<ResolvedFile>>,
    dependencies: BTreeMap<SourceName, Vec<Arc<ResolvedFile>>>,
}

impl DependencyGraph {
    /// Builds the include closure of `roots`.
    ///
    /// Files are visited breadth first: every file discovered at one include
    /// depth is parsed and resolved in parallel before the next depth starts.
    /// The first failure in any branch aborts construction; no partial graph
    /// is returned.
    pub fn build(
        resolver: &dyn ImportResolver,
        parser: &dyn ParseFile,
        roots: &[Arc<ResolvedFile>],
    ) -> Result<Self, GraphError> {
        let builder = Builder {
            resolver,
            parser,
            visited: DashMap::new(),
            files: DashMap::new(),
            dependencies: DashMap::new(),
        };
        // Level by level, so include depth never turns into stack depth.
        let mut frontier = roots.to_vec();
        let mut levels = 0usize;
        while !frontier.is_empty() {
            frontier = frontier
                .into_par_iter()
                .map(|file| builder.visit(file))
                .collect::<Result<Vec<_>, _>>()?
                .into_iter()
                .flatten()
                .collect();
            levels += 1;
        }

        let files: BTreeMap<SourceName, Arc<ResolvedFile>> = builder.files.into_iter().collect();
        let dependencies = builder
            .dependencies
            .into_iter()
            .map(|(name, deps)| {
                let deps = deps
                    .iter()
                    .filter_map(|dep| files.get(dep).cloned())
                    .collect();
                (name, deps)
            })
            .collect();
        debug!(
            roots = roots.len(),
            files = files.len(),
            levels,
            "dependency graph built"
        );
        Ok(Self {
            files,
            dependencies,
        })
    }

    /// Direct includes of `file`, in no particular order.
    pub fn dependencies(&self, file: &ResolvedFile) -> &[Arc<ResolvedFile>] {
        self.dependencies
            .get(file.source_name())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every file reachable from `file`, each once, with one path to it.
    ///
    /// Cyclic includes stop expanding at already-visited files. `file` itself
    /// is never part of the result, even when it is on a cycle.
    pub fn transitive_dependencies(&self, file: &ResolvedFile) -> Vec<TransitiveDependency> {
        let mut visited: HashSet<&SourceName> = HashSet::new();
        visited.insert(file.source_name());
        let mut stack: Vec<(&Arc<ResolvedFile>, Vec<Arc<ResolvedFile>>)> = self
            .dependencies(file)
            .iter()
            .map(|dep| (dep, Vec::new()))
            .collect();
        let mut result = Vec::new();

        while let Some((node, path)) = stack.pop() {
            if !visited.insert(node.source_name()) {
                continue;
            }
            result.push(TransitiveDependency {
                dependency: Arc::clone(node),
                path: path.clone(),
            });
            let mut next = path;
            next.push(Arc::clone(node));
            for dep in self.dependencies(node) {
                if !visited.contains(dep.source_name()) {
                    stack.push((dep, next.clone()));
                }
            }
        }
        result
    }

    /// Files that directly include `file`, in source-name order.
    pub fn dependents(&self, file: &ResolvedFile) -> Vec<Arc<ResolvedFile>> {
        self.dependencies
            .iter()
            .filter(|(_, deps)| deps.iter().any(|d| d.source_name() == file.source_name()))
            .filter_map(|(name, _)| self.files.get(name).cloned())
            .collect()
    }

    /// Groups of files that include each other, directly or indirectly.
    ///
    /// Each group is sorted by source name, and groups are sorted by their
    /// first member. A file that includes itself forms a group of one.
    pub fn include_cycles(&self) -> Vec<Vec<SourceName>> {
        let mut graph: DiGraph<&SourceName, ()> = DiGraph::new();
        let nodes: HashMap<&SourceName, NodeIndex> = self
            .files
            .keys()
            .map(|name| (name, graph.add_node(name)))
            .collect();
        for (name, deps) in &self.dependencies {
            for dep in deps {
                if let (Some(&from), Some(&to)) = (nodes.get(name), nodes.get(dep.source_name())) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        let mut cycles: Vec<Vec<SourceName>> = tarjan_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .map(|scc| {
                let mut names: Vec<SourceName> =
                    scc.iter().map(|&idx| graph[idx].clone()).collect();
                names.sort();
                names
            })
            .collect();
        cycles.sort();
        cycles
    }

    /// Returns `true` if the graph has no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files in the graph.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if `file` is in the graph under its name and path.
    pub fn has(&self, file: &ResolvedFile) -> bool {
        self.files
            .get(file.source_name())
            .is_some_and(|f| f.absolute_path() == file.absolute_path())
    }

    /// Looks up a file by source name.
    pub fn get(&self, source_name: &str) -> Option<&Arc<ResolvedFile>> {
        self.files.get(source_name)
    }

    /// All files, in source-name order.
    pub fn resolved_files(&self) -> impl Iterator<Item = &Arc<ResolvedFile>> {
        self.files.values()
    }

    /// Every file with its direct includes, in source-name order.
    pub fn entries(&self) -> impl Iterator<Item = (&Arc<ResolvedFile>, &[Arc<ResolvedFile>])> {
        self.files
            .values()
            .map(|file| (file, self.dependencies(file)))
    }
}

/// Shared state of one concurrent graph construction.
struct Builder<'a> {
    resolver: &'a dyn ImportResolver,
    parser: &'a dyn ParseFile,
    /// Absolute path to the name it was first reached under.
    visited: DashMap<PathBuf, SourceName>,
    files: DashMap<SourceName, Arc<ResolvedFile>>,
    /// Written once per file, by the task that registered it.
    dependencies: DashMap<SourceName, Vec<SourceName>>,
}

impl Builder<'_> {
    /// Registers `file` and returns its includes, or nothing if it was
    /// already registered.
    fn visit(&self, file: Arc<ResolvedFile>) -> Result<Vec<Arc<ResolvedFile>>, GraphError> {
        // Entry guards are released at the end of each match.
        match self.visited.entry(file.absolute_path().to_path_buf()) {
            Entry::Occupied(seen) if seen.get() != file.source_name() => {
                return Err(GraphError::ambiguous(
                    seen.get(),
                    file.source_name(),
                    file.absolute_path().to_path_buf(),
                ));
            }
            Entry::Occupied(_) => return Ok(Vec::new()),
            Entry::Vacant(slot) => {
                slot.insert(file.source_name().clone());
            }
        }
        match self.files.entry(file.source_name().clone()) {
            Entry::Occupied(existing) => {
                return Err(GraphError::duplicate(
                    file.source_name(),
                    existing.get().absolute_path().to_path_buf(),
                    file.absolute_path().to_path_buf(),
                ));
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&file));
            }
        }

        let data = self.parser.parse_file(&file)?;
        trace!(file = %file.source_name(), includes = data.includes.len(), "visiting");
        let resolved = data
            .includes
            .par_iter()
            .map(|specifier| self.resolver.resolve_import(&file, specifier))
            .collect::<Result<Vec<_>, _>>()?;

        let mut unique: Vec<Arc<ResolvedFile>> = Vec::with_capacity(resolved.len());
        for dep in resolved {
            match unique.iter().find(|u| u.source_name() == dep.source_name()) {
                Some(seen) if seen.absolute_path() != dep.absolute_path() => {
                    return Err(GraphError::duplicate(
                        dep.source_name(),
                        seen.absolute_path().to_path_buf(),
                        dep.absolute_path().to_path_buf(),
                    ));
                }
                Some(_) => {}
                None => unique.push(dep),
            }
        }
        let names = unique.iter().map(|d| d.source_name().clone()).collect();
        self.dependencies.insert(file.source_name().clone(), names);
        Ok(unique)
    }
}
