//! Logical source names: stable, machine-independent file identifiers.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::{Component, Path};

/// The logical name of a circuit file.
///
/// Project files are named by their path relative to the project root and
/// library files by `<library>/<path inside the library>`. Components are
/// always joined with `/` so the same project yields the same names on every
/// platform. Source names key both the dependency graph and the compile cache.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceName(String);

impl SourceName {
    /// Creates a source name, normalizing `\` separators to `/`.
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self(name.replace('\\', "/"))
    }

    /// Builds a source name from a relative path, optionally prefixed by a
    /// library name.
    ///
    /// Returns `None` if the path is absolute or contains `..` components.
    pub fn from_relative_path(prefix: Option<&str>, relative: &Path) -> Option<Self> {
        let mut parts: Vec<String> = prefix.map(|p| vec![p.to_string()]).unwrap_or_default();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn backslashes_normalized() {
        assert_eq!(SourceName::new("base\\a.circom").as_str(), "base/a.circom");
    }

    #[test]
    fn from_project_relative_path() {
        let name = SourceName::from_relative_path(None, &PathBuf::from("circuits/main.circom"));
        assert_eq!(name.unwrap().as_str(), "circuits/main.circom");
    }

    #[test]
    fn from_library_relative_path() {
        let name =
            SourceName::from_relative_path(Some("circomlib"), Path::new("circuits/poseidon.circom"));
        assert_eq!(name.unwrap().as_str(), "circomlib/circuits/poseidon.circom");
    }

    #[test]
    fn parent_components_rejected() {
        assert!(SourceName::from_relative_path(None, Path::new("../outside.circom")).is_none());
        assert!(SourceName::from_relative_path(None, Path::new("")).is_none());
    }

    #[test]
    fn borrow_as_str_for_map_lookup() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(SourceName::new("a.circom"), 1);
        assert_eq!(map.get("a.circom"), Some(&1));
    }

    #[test]
    fn serde_transparent() {
        let name = SourceName::new("lib/x.circom");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"lib/x.circom\"");
        let back: SourceName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
