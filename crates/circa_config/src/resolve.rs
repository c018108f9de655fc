//! Project resolution: anchoring configured paths at the project root.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, SetupConfig};
use circa_common::CompileFlags;
use std::path::{Path, PathBuf};

/// A library with its root resolved against the project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLibrary {
    /// The library name.
    pub name: String,
    /// Absolute library root.
    pub root: PathBuf,
    /// The configured version, if any.
    pub version: Option<String>,
}

/// A project configuration with every path made absolute.
///
/// Produced by [`resolve_project`]; all directories are anchored at the
/// project root and, except for output and cache directories, verified to
/// exist.
#[derive(Debug, Clone)]
pub struct ResolvedProject {
    /// The project name.
    pub name: String,
    /// The project root directory.
    pub root: PathBuf,
    /// Source directories to discover circuits in.
    pub source_dirs: Vec<PathBuf>,
    /// Directories whose sub-directories are libraries.
    pub library_dirs: Vec<PathBuf>,
    /// Explicitly configured libraries.
    pub libraries: Vec<ResolvedLibrary>,
    /// The compiler executable.
    pub compiler: String,
    /// Extra compiler arguments.
    pub compiler_args: Vec<String>,
    /// Flags compiled circuits are produced with.
    pub compile_flags: CompileFlags,
    /// Output directory for compiled artifacts.
    pub output_dir: PathBuf,
    /// Whether the compile cache may be reused.
    pub cache_enabled: bool,
    /// The cache directory.
    pub cache_dir: PathBuf,
    /// Trusted setup settings.
    pub setup: SetupConfig,
}

/// Resolves all configured paths against `project_root`.
///
/// Source directories and explicit library roots must exist; library search
/// directories may be missing (nothing is discovered in them).
pub fn resolve_project(
    config: &ProjectConfig,
    project_root: &Path,
) -> Result<ResolvedProject, ConfigError> {
    let anchor = |p: &str| project_root.join(p);

    let source_dirs: Vec<PathBuf> = config.project.sources.iter().map(|s| anchor(s)).collect();
    for dir in &source_dirs {
        if !dir.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "source directory {} does not exist",
                dir.display()
            )));
        }
    }

    let mut libraries = Vec::with_capacity(config.libraries.len());
    for (name, lib) in &config.libraries {
        let root = anchor(&lib.path);
        if !root.is_dir() {
            return Err(ConfigError::ValidationError(format!(
                "library '{name}' root {} does not exist",
                root.display()
            )));
        }
        libraries.push(ResolvedLibrary {
            name: name.clone(),
            root,
            version: lib.version.clone(),
        });
    }

    Ok(ResolvedProject {
        name: config.project.name.clone(),
        root: project_root.to_path_buf(),
        source_dirs,
        library_dirs: config.project.library_dirs.iter().map(|d| anchor(d)).collect(),
        libraries,
        compiler: config.compiler.path.clone(),
        compiler_args: config.compiler.args.clone(),
        compile_flags: config.build.compile_flags(),
        output_dir: anchor(&config.build.output),
        cache_enabled: config.cache.enabled,
        cache_dir: anchor(&config.cache.dir),
        setup: config.setup.clone(),
    })
}
