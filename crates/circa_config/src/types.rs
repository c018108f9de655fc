//! Configuration types deserialized from `circa.toml`.

use circa_common::{CompileFlags, ProvingSystem, SetupSettings};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The top-level project configuration parsed from `circa.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, source directories, library directories).
    pub project: ProjectMeta,
    /// Explicitly configured circuit libraries, keyed by library name.
    #[serde(default)]
    pub libraries: BTreeMap<String, LibrarySpec>,
    /// The external compiler to drive.
    #[serde(default)]
    pub compiler: CompilerConfig,
    /// Compiler output and optimization settings.
    #[serde(default)]
    pub build: BuildConfig,
    /// Compile cache location.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Trusted setup settings recorded in the setup cache.
    #[serde(default)]
    pub setup: SetupConfig,
}

/// Core project metadata required in every `circa.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Directories holding the project's circuits, relative to the project root.
    ///
    /// Accepts either a single string or a list of strings.
    #[serde(
        default = "default_sources",
        deserialize_with = "deserialize_string_or_vec"
    )]
    pub sources: Vec<String>,
    /// Directories whose sub-directories are installed libraries.
    #[serde(default = "default_library_dirs")]
    pub library_dirs: Vec<String>,
}

fn default_sources() -> Vec<String> {
    vec!["circuits".to_string()]
}

fn default_library_dirs() -> Vec<String> {
    vec!["node_modules".to_string()]
}

/// Location of an explicitly configured library.
#[derive(Debug, Clone, Deserialize)]
pub struct LibrarySpec {
    /// Library root, relative to the project root.
    pub path: String,
    /// The library version, recorded for diagnostics.
    #[serde(default)]
    pub version: Option<String>,
}

/// The external compiler executable and its extra arguments.
#[derive(Debug, Clone, Deserialize)]
pub struct CompilerConfig {
    /// Executable name or path.
    #[serde(default = "default_compiler")]
    pub path: String,
    /// Arguments appended to every invocation.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_compiler() -> String {
    "circom".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            path: default_compiler(),
            args: Vec::new(),
        }
    }
}

/// Compiler output and optimization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Emit the constraint system.
    #[serde(default = "default_true")]
    pub r1cs: bool,
    /// Emit the WebAssembly witness generator.
    #[serde(default = "default_true")]
    pub wasm: bool,
    /// Emit the symbol table.
    #[serde(default)]
    pub sym: bool,
    /// Emit constraints as JSON.
    #[serde(default)]
    pub json: bool,
    /// Emit the C++ witness generator.
    #[serde(default)]
    pub c: bool,
    /// Constraint simplification level.
    #[serde(default)]
    pub optimization: OptLevel,
    /// Output directory for compiled artifacts, relative to the project root.
    #[serde(default = "default_output")]
    pub output: String,
}

fn default_true() -> bool {
    true
}

fn default_output() -> String {
    "build".to_string()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            r1cs: true,
            wasm: true,
            sym: false,
            json: false,
            c: false,
            optimization: OptLevel::default(),
            output: default_output(),
        }
    }
}

impl BuildConfig {
    /// The compile flags these settings correspond to.
    pub fn compile_flags(&self) -> CompileFlags {
        CompileFlags {
            r1cs: self.r1cs,
            wasm: self.wasm,
            sym: self.sym,
            json: self.json,
            c: self.c,
            o0: self.optimization == OptLevel::O0,
            o1: self.optimization == OptLevel::O1,
            o2: self.optimization == OptLevel::O2,
        }
    }
}

/// Constraint simplification level.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub enum OptLevel {
    /// No simplification.
    O0,
    /// Signal-to-signal and signal-to-constant simplification (default).
    #[default]
    O1,
    /// Full simplification.
    O2,
}

/// Compile cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether cached results may be reused.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
}

fn default_cache_dir() -> String {
    ".circa-cache".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
        }
    }
}

/// Trusted setup settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SetupConfig {
    /// The proving system.
    #[serde(default)]
    pub proving_system: ProvingSystem,
    /// Number of phase 2 contributions.
    #[serde(default = "default_contributions")]
    pub contributions: u32,
}

fn default_contributions() -> u32 {
    1
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            proving_system: ProvingSystem::default(),
            contributions: default_contributions(),
        }
    }
}

impl SetupConfig {
    /// The settings recorded in setup cache entries.
    pub fn settings(&self) -> SetupSettings {
        SetupSettings {
            proving_system: self.proving_system,
            contribution_count: self.contributions,
        }
    }
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows TOML config to accept both `sources = "circuits"` (string) and
/// `sources = ["circuits", "test"]` (array of strings).
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_flags_follow_optimization_level() {
        let build = BuildConfig {
            optimization: OptLevel::O2,
            sym: true,
            ..BuildConfig::default()
        };
        let flags = build.compile_flags();
        assert!(flags.r1cs && flags.wasm && flags.sym);
        assert!(!flags.o0 && !flags.o1 && flags.o2);
    }

    #[test]
    fn default_build_flags() {
        let flags = BuildConfig::default().compile_flags();
        assert_eq!(flags.to_args(), vec!["--r1cs", "--wasm", "--O1"]);
    }

    #[test]
    fn setup_settings_from_config() {
        let setup = SetupConfig {
            proving_system: ProvingSystem::Plonk,
            contributions: 0,
        };
        let settings = setup.settings();
        assert_eq!(settings.proving_system, ProvingSystem::Plonk);
        assert_eq!(settings.contribution_count, 0);
    }
}
