//! `circa clean`: delete the cache directory.

use crate::pipeline::load_project;
use crate::GlobalArgs;

/// Runs the `circa clean` command. Returns exit code 0 whether or not a cache
/// existed.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project = load_project(global)?;
    let cache_dir = &project.config.cache_dir;
    if cache_dir == &project.config.root {
        return Err("refusing to delete the project root as a cache directory".into());
    }
    if cache_dir.exists() {
        std::fs::remove_dir_all(cache_dir)?;
        if !global.quiet {
            eprintln!("    Removed {}", cache_dir.display());
        }
    } else if !global.quiet {
        eprintln!("    Nothing to clean");
    }
    Ok(0)
}
