//! `circa status`: show which circuits need recompiling.

use circa_cache::SetupCache;
use circa_common::ContentHash;
use circa_graph::CompilePlan;
use circa_source::ResolvedFile;

use crate::pipeline::{build_graph, load_project, warn_cycles, Project};
use crate::GlobalArgs;

/// Runs the `circa status` command.
///
/// Lists every circuit as stale (with the reason) or fresh. circa never
/// writes the setup cache itself; it is maintained by the trusted-setup
/// tooling. When that cache file exists, fresh circuits whose compiled
/// constraint system no longer matches their setup entry are marked as
/// needing setup. Without the file no setup state is shown.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let cache = project.read_compile_cache();
    let Some(graph) = build_graph(&project, &cache, global)? else {
        return Ok(1);
    };
    let plan = CompilePlan::new(&graph, &cache, project.config.compile_flags);

    for file in plan.stale() {
        if let Some(reason) = plan.reason(file) {
            println!("stale  {} ({reason})", file.source_name());
        }
    }

    let setup_file = project.setup_cache_file();
    let setup_cache = setup_file
        .is_file()
        .then(|| SetupCache::read_from_file(&setup_file));
    for file in plan.fresh() {
        let pending = setup_cache
            .as_ref()
            .is_some_and(|setup| setup_pending(&project, setup, file));
        if pending {
            println!("fresh  {} (setup pending)", file.source_name());
        } else {
            println!("fresh  {}", file.source_name());
        }
    }

    if !global.quiet {
        warn_cycles(&graph);
        eprintln!(
            "   {} circuit(s): {} stale, {} fresh",
            plan.stale().count() + plan.fresh().len(),
            plan.stale().count(),
            plan.fresh().len()
        );
    }
    Ok(0)
}

/// Returns `true` if `circuit` has a compiled constraint system that its
/// setup entry does not cover.
fn setup_pending(project: &Project, setup: &SetupCache, circuit: &ResolvedFile) -> bool {
    let r1cs = project.artifact_path(circuit.absolute_path(), "r1cs");
    match std::fs::read(&r1cs) {
        Ok(bytes) => setup.has_changed(
            circuit.source_name().as_str(),
            ContentHash::from_bytes(&bytes),
            &project.config.setup.settings(),
        ),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn status_on_fresh_project() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("circa.toml"), "[project]\nname = \"demo\"\n").unwrap();
        fs::create_dir_all(dir.path().join("circuits")).unwrap();
        fs::write(
            dir.path().join("circuits/main.circom"),
            "template T() { signal input x; }\ncomponent main = T();\n",
        )
        .unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().to_string_lossy().into_owned()),
        };
        assert_eq!(run(&global).unwrap(), 0);
    }

    #[test]
    fn status_reports_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("circa.toml"), "[project]\nname = \"demo\"\n").unwrap();
        fs::create_dir_all(dir.path().join("circuits")).unwrap();
        fs::write(dir.path().join("circuits/main.circom"), "include \"a.circom\"\n").unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().to_string_lossy().into_owned()),
        };
        assert_eq!(run(&global).unwrap(), 1);
    }

    #[test]
    fn setup_pending_compares_r1cs_and_settings() {
        use circa_cache::SetupCacheEntry;

        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("circa.toml"), "[project]\nname = \"demo\"\n").unwrap();
        fs::create_dir_all(dir.path().join("circuits")).unwrap();
        fs::write(
            dir.path().join("circuits/main.circom"),
            "template T() { signal input x; }\ncomponent main = T();\n",
        )
        .unwrap();
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            color: false,
            config: Some(dir.path().to_string_lossy().into_owned()),
        };
        let project = load_project(&global).unwrap();
        let cache = project.read_compile_cache();
        let graph = build_graph(&project, &cache, &global).unwrap().unwrap();
        let main = graph.get("circuits/main.circom").unwrap();
        let mut setup = SetupCache::new();

        // Not compiled yet.
        assert!(!setup_pending(&project, &setup, main));

        let r1cs = project.artifact_path(main.absolute_path(), "r1cs");
        fs::create_dir_all(r1cs.parent().unwrap()).unwrap();
        fs::write(&r1cs, b"constraints").unwrap();
        assert!(setup_pending(&project, &setup, main));

        setup.add_entry(SetupCacheEntry {
            circuit_name: "circuits/main.circom".to_string(),
            r1cs_content_hash: ContentHash::from_bytes(b"constraints"),
            r1cs_path: r1cs.clone(),
            settings: project.config.setup.settings(),
        });
        assert!(!setup_pending(&project, &setup, main));

        fs::write(&r1cs, b"recompiled constraints").unwrap();
        assert!(setup_pending(&project, &setup, main));
    }
}
