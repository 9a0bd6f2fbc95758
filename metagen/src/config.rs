use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::types::Capability;

/// Generator configuration, usually stored in `metamodel.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetamodelConfig {
    /// Appended to the entity name to form the generated name.
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Module the generated code takes descriptor, path and join types from.
    #[serde(default = "default_runtime_path")]
    pub runtime_path: String,
    /// Track contributing declarations instead of depending on all inputs.
    #[serde(default)]
    pub precise_dependencies: bool,
    #[serde(default)]
    pub markers: MarkerSettings,
    #[serde(default)]
    pub capabilities: CapabilitySettings,
    /// Foreign types accepted as opaque singular attributes (`uuid::Uuid`).
    #[serde(default)]
    pub extern_types: Vec<String>,
}

impl Default for MetamodelConfig {
    fn default() -> Self {
        Self {
            suffix: default_suffix(),
            runtime_path: default_runtime_path(),
            precise_dependencies: false,
            markers: MarkerSettings::default(),
            capabilities: CapabilitySettings::default(),
            extern_types: Vec::new(),
        }
    }
}

fn default_suffix() -> String {
    "_".to_string()
}

fn default_runtime_path() -> String {
    "::metagen::criteria".to_string()
}

/// Names the source scanner recognises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSettings {
    #[serde(default = "default_entity_marker")]
    pub entity: String,
    #[serde(default = "default_mapped_superclass_marker")]
    pub mapped_superclass: String,
    /// Helper attribute carrying `abstract`, `extends = ".."`, relationships.
    #[serde(default = "default_attribute")]
    pub attribute: String,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            entity: default_entity_marker(),
            mapped_superclass: default_mapped_superclass_marker(),
            attribute: default_attribute(),
        }
    }
}

fn default_entity_marker() -> String {
    "Entity".to_string()
}

fn default_mapped_superclass_marker() -> String {
    "MappedSuperclass".to_string()
}

fn default_attribute() -> String {
    "metamodel".to_string()
}

/// Extra type names treated as collection capabilities, beyond the standard ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySettings {
    #[serde(default)]
    pub map: Vec<String>,
    #[serde(default)]
    pub list: Vec<String>,
    #[serde(default)]
    pub set: Vec<String>,
    #[serde(default)]
    pub collection: Vec<String>,
}

impl CapabilitySettings {
    /// Capabilities configured for a type, matched by full path or simple name.
    pub fn capabilities_of(&self, name: &str) -> Vec<Capability> {
        let simple = name.rsplit("::").next().unwrap_or(name);
        let matches = |names: &[String]| {
            names.iter().any(|configured| {
                let configured = configured.trim_start_matches("::");
                configured == name.trim_start_matches("::") || configured.rsplit("::").next() == Some(simple)
            })
        };

        [
            (Capability::Map, &self.map),
            (Capability::List, &self.list),
            (Capability::Set, &self.set),
            (Capability::Collection, &self.collection),
        ]
        .into_iter()
        .filter(|(_, names)| matches(names.as_slice()))
        .map(|(capability, _)| capability)
        .collect()
    }
}

impl MetamodelConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Whether a written type path names a configured foreign type.
    pub fn extern_type(&self, path: &str) -> Option<&str> {
        let simple = path.rsplit("::").next().unwrap_or(path);
        self.extern_types
            .iter()
            .find(|configured| {
                let configured = configured.trim_start_matches("::");
                configured == path.trim_start_matches("::") || configured.rsplit("::").next() == Some(simple)
            })
            .map(String::as_str)
    }
}
