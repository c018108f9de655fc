//! `circa compile`: run the compiler on stale circuits.
//!
//! Orchestrates an incremental build:
//! 1. Load the project and the compile cache
//! 2. Build the include graph
//! 3. Classify circuits as stale or fresh
//! 4. Invoke the external compiler for each stale circuit
//! 5. Record every graph file in the cache, prune, and persist

use std::path::{Path, PathBuf};
use std::process::Command;

use circa_graph::CompilePlan;
use tracing::{debug, info};

use crate::pipeline::{build_graph, load_project, warn_cycles, Project};
use crate::{CompileArgs, GlobalArgs};

/// Runs the `circa compile` command.
///
/// A failing compiler aborts the command before the cache is written, so the
/// failed circuit and everything after it stay stale. Returns exit code 0 on
/// success, 1 if the graph could not be built.
pub fn run(args: &CompileArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    if !global.quiet {
        eprintln!("   Compiling {}", project.config.name);
    }

    let mut cache = project.read_compile_cache();
    let Some(graph) = build_graph(&project, &cache, global)? else {
        return Ok(1);
    };
    if !global.quiet {
        warn_cycles(&graph);
    }

    let flags = project.config.compile_flags;
    let plan = if args.force {
        CompilePlan::forced(&graph, &cache, flags)
    } else {
        CompilePlan::new(&graph, &cache, flags)
    };

    let include_paths = include_paths(&project);
    let mut compiled = 0usize;
    for file in plan.stale() {
        if !global.quiet {
            let reason = plan.reason(file).map(ToString::to_string).unwrap_or_default();
            eprintln!("    Building {} ({reason})", file.source_name());
        }
        compile_circuit(&project, file.absolute_path(), &include_paths)?;
        compiled += 1;
    }

    for file in graph.resolved_files() {
        cache.record(file, flags);
    }
    let pruned = cache.remove_entries_not_in_files(graph.resolved_files().map(|f| f.absolute_path()));
    debug!(pruned, entries = cache.len(), "updated compile cache");
    if project.config.cache_enabled {
        cache.write_to_file(&project.compile_cache_file())?;
    }

    if !global.quiet {
        if compiled == 0 {
            eprintln!("    Up to date ({} circuit(s))", plan.fresh().len());
        } else {
            eprintln!(
                "    Finished {compiled} compiled, {} unchanged",
                plan.fresh().len()
            );
        }
    }
    Ok(0)
}

/// Directories passed to the compiler as `-l` include paths.
///
/// The project root comes first, followed by library search directories and
/// the parents of explicitly configured libraries, so both relative and
/// library-prefixed includes resolve for the compiler as they do here.
fn include_paths(project: &Project) -> Vec<PathBuf> {
    let mut paths = vec![project.config.root.clone()];
    paths.extend(project.config.library_dirs.iter().cloned());
    for lib in &project.config.libraries {
        if let Some(parent) = lib.root.parent() {
            paths.push(parent.to_path_buf());
        }
    }
    let mut seen = std::collections::HashSet::new();
    paths.retain(|p| seen.insert(p.clone()));
    paths
}

/// Invokes the configured compiler on one circuit.
fn compile_circuit(
    project: &Project,
    circuit: &Path,
    include_paths: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = &project.config.output_dir;
    std::fs::create_dir_all(output_dir)?;

    let mut command = Command::new(&project.config.compiler);
    command
        .arg(circuit)
        .args(project.config.compile_flags.to_args())
        .args(&project.config.compiler_args);
    for path in include_paths {
        command.arg("-l").arg(path);
    }
    command.arg("-o").arg(output_dir);

    info!(circuit = %circuit.display(), compiler = %project.config.compiler, "invoking compiler");
    let status = command.status().map_err(|e| {
        format!(
            "failed to run compiler '{}': {e}",
            project.config.compiler
        )
    })?;
    if !status.success() {
        return Err(format!(
            "compiler exited with {status} while compiling {}",
            circuit.display()
        )
        .into());
    }
    Ok(())
}
