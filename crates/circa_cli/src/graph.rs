//! `circa graph`: print the include graph.

use std::path::Path;
use std::sync::Arc;

use circa_graph::DependencyGraph;
use circa_source::ResolvedFile;

use crate::pipeline::{build_graph, load_project, warn_cycles, Project};
use crate::{GlobalArgs, GraphArgs};

/// Runs the `circa graph` command.
///
/// Prints each file followed by its includes, one per line. With a file
/// argument only that file is shown. Returns exit code 0 on success, 1 if the
/// graph could not be built.
pub fn run(args: &GraphArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let cache = project.read_compile_cache();
    let Some(graph) = build_graph(&project, &cache, global)? else {
        return Ok(1);
    };

    let files: Vec<&Arc<ResolvedFile>> = match &args.file {
        Some(file) => vec![lookup(&graph, &project, file)?],
        None => graph.resolved_files().collect(),
    };
    for file in files {
        println!("{}", file.source_name());
        if args.transitive {
            let mut deps = graph.transitive_dependencies(file);
            deps.sort_by(|a, b| a.dependency.source_name().cmp(b.dependency.source_name()));
            for dep in deps {
                if dep.path.is_empty() {
                    println!("  {}", dep.dependency.source_name());
                } else {
                    let via: Vec<&str> = dep.path.iter().map(|p| p.source_name().as_str()).collect();
                    println!("  {} (via {})", dep.dependency.source_name(), via.join(" -> "));
                }
            }
        } else {
            let mut deps: Vec<&str> = graph
                .dependencies(file)
                .iter()
                .map(|d| d.source_name().as_str())
                .collect();
            deps.sort_unstable();
            for dep in deps {
                println!("  {dep}");
            }
        }
    }

    if !global.quiet {
        warn_cycles(&graph);
    }
    Ok(0)
}

/// Finds a file by source name, or by path (absolute or relative to the
/// project root).
fn lookup<'g>(
    graph: &'g DependencyGraph,
    project: &Project,
    file: &str,
) -> Result<&'g Arc<ResolvedFile>, Box<dyn std::error::Error>> {
    if let Some(found) = graph.get(file) {
        return Ok(found);
    }
    let resolved = project.resolver.resolve_project_file(Path::new(file))?;
    graph
        .get(resolved.source_name().as_str())
        .ok_or_else(|| format!("{file} is not reachable from the project's circuits").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn sample() -> (tempfile::TempDir, GlobalArgs) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("circa.toml"), "[project]\nname = \"demo\"\n").unwrap();
        fs::create_dir_all(dir.path().join("circuits")).unwrap();
        fs::write(
            dir.path().join("circuits/main.circom"),
            "include \"a.circom\";\ncomponent main = A();\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("circuits/a.circom"),
            "include \"b.circom\";\ntemplate A() { signal input x; }\n",
        )
        .unwrap();
        fs::write(dir.path().join("circuits/b.circom"), "template B() {}\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().to_string_lossy().into_owned()),
        };
        (dir, global)
    }

    #[test]
    fn lookup_by_name_and_path() {
        let (dir, global) = sample();
        let project = load_project(&global).unwrap();
        let cache = project.read_compile_cache();
        let graph = build_graph(&project, &cache, &global).unwrap().unwrap();

        let by_name = lookup(&graph, &project, "circuits/a.circom").unwrap();
        assert_eq!(by_name.source_name().as_str(), "circuits/a.circom");

        let path = dir.path().join("circuits/b.circom");
        let by_path = lookup(&graph, &project, &path.to_string_lossy()).unwrap();
        assert_eq!(by_path.source_name().as_str(), "circuits/b.circom");

        assert!(lookup(&graph, &project, "circuits/nope.circom").is_err());
    }

    #[test]
    fn run_prints_graph() {
        let (_dir, global) = sample();
        let args = GraphArgs {
            file: Some("circuits/main.circom".to_string()),
            transitive: true,
        };
        assert_eq!(run(&args, &global).unwrap(), 0);
        let all = GraphArgs {
            file: None,
            transitive: false,
        };
        assert_eq!(run(&all, &global).unwrap(), 0);
    }
}
