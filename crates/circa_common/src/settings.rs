//! Build settings that participate in cache validity.
//!
//! A cached compilation is only reusable if it was produced with the same
//! [`CompileFlags`], and a cached setup only if it used the same
//! [`SetupSettings`], so both are stored alongside the cache entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output and optimization flags passed to the external compiler.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct CompileFlags {
    /// Emit the constraint system (`.r1cs`).
    pub r1cs: bool,
    /// Emit the WebAssembly witness generator.
    pub wasm: bool,
    /// Emit the symbol table (`.sym`).
    pub sym: bool,
    /// Emit the constraints as JSON.
    pub json: bool,
    /// Emit the C++ witness generator.
    pub c: bool,
    /// No simplification.
    #[serde(rename = "O0")]
    pub o0: bool,
    /// Signal-to-signal and signal-to-constant simplification.
    #[serde(rename = "O1")]
    pub o1: bool,
    /// Full constraint simplification.
    #[serde(rename = "O2")]
    pub o2: bool,
}

impl CompileFlags {
    /// Command-line arguments enabling each set flag, in a fixed order.
    pub fn to_args(&self) -> Vec<&'static str> {
        [
            (self.r1cs, "--r1cs"),
            (self.wasm, "--wasm"),
            (self.sym, "--sym"),
            (self.json, "--json"),
            (self.c, "--c"),
            (self.o0, "--O0"),
            (self.o1, "--O1"),
            (self.o2, "--O2"),
        ]
        .into_iter()
        .filter_map(|(set, arg)| set.then_some(arg))
        .collect()
    }
}

/// The proving system a trusted setup is performed for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvingSystem {
    /// Groth16 (per-circuit phase 2 contributions).
    #[default]
    Groth16,
    /// PLONK (universal setup, no contributions).
    Plonk,
    /// FFLONK (universal setup, no contributions).
    Fflonk,
}

impl fmt::Display for ProvingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvingSystem::Groth16 => write!(f, "groth16"),
            ProvingSystem::Plonk => write!(f, "plonk"),
            ProvingSystem::Fflonk => write!(f, "fflonk"),
        }
    }
}

impl FromStr for ProvingSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "groth16" => Ok(ProvingSystem::Groth16),
            "plonk" => Ok(ProvingSystem::Plonk),
            "fflonk" => Ok(ProvingSystem::Fflonk),
            other => Err(format!("unknown proving system '{other}'")),
        }
    }
}

/// Settings a cached setup was produced with.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupSettings {
    /// The proving system.
    pub proving_system: ProvingSystem,
    /// Number of phase 2 contributions.
    pub contribution_count: u32,
}
