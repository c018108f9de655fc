//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "circa.toml";

/// Loads and validates a `circa.toml` configuration from a project directory.
///
/// Reads `<project_dir>/circa.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `circa.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.sources.is_empty() || config.project.sources.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::MissingField("project.sources".to_string()));
    }
    for (name, lib) in &config.libraries {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::ValidationError(format!(
                "library name '{name}' is not a single path segment"
            )));
        }
        if lib.path.is_empty() {
            return Err(ConfigError::MissingField(format!("libraries.{name}.path")));
        }
    }
    if config.compiler.path.is_empty() {
        return Err(ConfigError::MissingField("compiler.path".to_string()));
    }
    if config.cache.dir.is_empty() {
        return Err(ConfigError::MissingField("cache.dir".to_string()));
    }
    Ok(())
}
