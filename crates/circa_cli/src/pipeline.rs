//! Shared pipeline helpers for CLI commands.
//!
//! Project root discovery, configuration loading, circuit discovery, resolver
//! setup, graph construction, and diagnostic reporting.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use circa_cache::{CompileCache, COMPILE_CACHE_FILE, SETUP_CACHE_FILE};
use circa_config::{ResolvedProject, CONFIG_FILE};
use circa_diagnostics::{DiagnosticRenderer, TerminalRenderer};
use circa_graph::{DependencyGraph, GraphError};
use circa_parser::{FileParser, HeaderScanner, ParseError};
use circa_source::{FileResolver, ResolvedFile};
use tracing::{debug, info};

use crate::GlobalArgs;

/// File extensions of circuit sources.
const CIRCUIT_EXTENSIONS: &[&str] = &["circom", "circuit"];

/// A loaded project: resolved configuration plus a resolver for it.
pub struct Project {
    /// Configuration with every path anchored at the project root.
    pub config: ResolvedProject,
    /// Include resolver for the project and its libraries.
    pub resolver: FileResolver,
}

impl Project {
    /// Path of the compile cache file.
    pub fn compile_cache_file(&self) -> PathBuf {
        self.config.cache_dir.join(COMPILE_CACHE_FILE)
    }

    /// Path of the setup cache file.
    pub fn setup_cache_file(&self) -> PathBuf {
        self.config.cache_dir.join(SETUP_CACHE_FILE)
    }

    /// Path of the artifact the compiler writes for `circuit` with `extension`.
    pub fn artifact_path(&self, circuit: &Path, extension: &str) -> PathBuf {
        let stem = circuit.file_stem().unwrap_or_default();
        self.config
            .output_dir
            .join(format!("{}.{extension}", stem.to_string_lossy()))
    }

    /// Reads the compile cache, or starts empty when caching is disabled.
    pub fn read_compile_cache(&self) -> CompileCache {
        if self.config.cache_enabled {
            CompileCache::read_from_file(&self.compile_cache_file())
        } else {
            CompileCache::new()
        }
    }
}

/// Walks up from `start` looking for the nearest directory containing `circa.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `circa.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Loads `circa.toml` and sets up the include resolver.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let config = circa_config::load_config(&root)?;
    let config = circa_config::resolve_project(&config, &root)?;
    let resolver = build_resolver(&config)?;
    Ok(Project { config, resolver })
}

/// Creates a resolver with the project's explicit libraries and library
/// search directories.
pub fn build_resolver(project: &ResolvedProject) -> Result<FileResolver, Box<dyn std::error::Error>> {
    let mut resolver = FileResolver::new(&project.root)?;
    for lib in &project.libraries {
        resolver = resolver.with_library(lib.name.clone(), &lib.root, lib.version.clone())?;
    }
    for dir in &project.library_dirs {
        resolver = resolver.with_library_dir(dir);
    }
    Ok(resolver)
}

/// Discovers circuit files in the given directories (recursive), sorted by path.
pub fn discover_circuits(dirs: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    for dir in dirs {
        walk_dir(dir, &mut files)?;
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk_dir(&path, files)?;
        } else if is_circuit(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns `true` if `path` has a circuit file extension.
pub fn is_circuit(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| CIRCUIT_EXTENSIONS.contains(&e))
}

/// Resolves the project's circuits and builds their include graph.
///
/// Files whose modification time matches `cache` keep their cached hash and
/// are not read. Parse diagnostics are rendered to stderr. Returns `Ok(None)`
/// when the graph could not be built because of reported problems.
pub fn build_graph(
    project: &Project,
    cache: &CompileCache,
    global: &GlobalArgs,
) -> Result<Option<DependencyGraph>, Box<dyn std::error::Error>> {
    let seeds = discover_circuits(&project.config.source_dirs)?;
    if seeds.is_empty() {
        eprintln!("warning: no circuit files found");
    }
    let resolver = project.resolver.clone().with_known_hashes(cache.fingerprints());
    let roots = seeds
        .iter()
        .map(|path| resolver.resolve_project_file(path))
        .collect::<Result<Vec<Arc<ResolvedFile>>, _>>()?;
    debug!(roots = roots.len(), "resolved root files");

    let scanner = HeaderScanner::new();
    let parser = FileParser::new(&scanner, cache);
    let result = DependencyGraph::build(&resolver, &parser, &roots);
    let stats = parser.stats();
    info!(
        parsed = stats.grammar_runs,
        reused = stats.memory_hits + stats.cache_hits,
        "parsed circuit files"
    );

    match result {
        Ok(graph) => Ok(Some(graph)),
        Err(GraphError::Parse(ParseError::Syntax { path, diagnostics })) => {
            let source = std::fs::read_to_string(&path).ok();
            let renderer = TerminalRenderer::new(global.color);
            for diag in &diagnostics {
                eprint!("{}", renderer.render(diag, &path, source.as_deref()));
            }
            eprintln!(
                "error: could not parse {} ({} error(s))",
                path.display(),
                diagnostics.len()
            );
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Prints include cycles of `graph` as warnings.
pub fn warn_cycles(graph: &DependencyGraph) {
    for cycle in graph.include_cycles() {
        let names: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
        eprintln!("warning: include cycle between {}", names.join(", "));
    }
}
