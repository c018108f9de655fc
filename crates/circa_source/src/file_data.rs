//! Declarations extracted from a circuit file by the grammar collaborator.
//!
//! These types are stored verbatim in the compile cache, so every field is
//! serializable and compared structurally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything the build driver needs to know about one parsed circuit file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFileData {
    /// Pragma directives at the top of the file.
    pub pragma: PragmaInfo,
    /// Raw include specifiers, in source order.
    pub includes: Vec<String>,
    /// Templates declared in the file, keyed by template name.
    pub templates: BTreeMap<String, TemplateInfo>,
    /// The `component main` declaration, if the file has one.
    pub main_component: Option<MainComponentInfo>,
}

impl ResolvedFileData {
    /// Returns `true` if the file declares a main component and is therefore a
    /// compilation entry point.
    pub fn has_main_component(&self) -> bool {
        self.main_component.is_some()
    }
}

/// Pragma directives of a circuit file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PragmaInfo {
    /// The compiler version requested by `pragma circom <version>;`.
    pub compiler_version: Option<String>,
    /// Whether `pragma custom_templates;` is present.
    pub custom_templates: bool,
}

/// A template declaration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Parameter names, in declaration order.
    pub parameters: Vec<String>,
    /// Declared input signal names, in declaration order.
    pub inputs: Vec<String>,
    /// Whether the template is declared `custom`.
    pub custom: bool,
}

/// The `component main` entry point of a circuit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainComponentInfo {
    /// Name of the instantiated template.
    pub template: String,
    /// Signals listed in `{public [...]}`.
    pub public_inputs: Vec<String>,
    /// Constructor argument expressions as written in the source.
    pub parameters: Vec<String>,
    /// Concrete parameter values and input signals, once resolved.
    pub resolved: Option<ResolvedMainComponent>,
}

/// Main component details that depend on concrete parameter values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMainComponent {
    /// Evaluated constructor arguments.
    pub parameter_values: Vec<i64>,
    /// Input signals of the main template with their evaluated dimensions.
    pub signals: Vec<SignalInfo>,
}

/// An input signal with concrete dimensions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalInfo {
    /// Signal name.
    pub name: String,
    /// Array dimensions; empty for a scalar signal.
    pub dimensions: Vec<u64>,
}

impl SignalInfo {
    /// Total number of field elements carried by the signal.
    pub fn element_count(&self) -> u64 {
        self.dimensions.iter().product()
    }
}
