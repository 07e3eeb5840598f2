//! Catalog loading
//!
//! The built-in catalog is embedded at compile time so the CLI works
//! without any file on disk.

use super::types::ResourceDescriptor;
use crate::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Built-in catalog YAML
pub const BUILTIN_CATALOG: &str = include_str!("../../resources/dynamicsbc.yaml");

/// An ordered set of resource descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// Resources in extraction order
    #[serde(default)]
    pub resources: Vec<ResourceDescriptor>,
}

impl Catalog {
    /// The catalog shipped with the binary
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    /// Parse a catalog from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        Self::from_yaml_str(&contents)
    }

    /// Check names are unique and paths absolute
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for resource in &self.resources {
            if resource.name.is_empty() {
                return Err(Error::config("resource with empty name"));
            }
            if !seen.insert(resource.name.as_str()) {
                return Err(Error::config(format!(
                    "duplicate resource '{}'",
                    resource.name
                )));
            }
            if !resource.path.starts_with('/') {
                return Err(Error::invalid_value(
                    format!("{}.path", resource.name),
                    "must start with '/'",
                ));
            }
        }
        Ok(())
    }

    /// Look up a resource by name
    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.resources.iter().find(|r| r.name == name)
    }

    /// Resource names in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.resources.iter().map(|r| r.name.as_str()).collect()
    }

    /// Pick resources by name; an empty selection means all
    pub fn select(&self, names: &[String]) -> Result<Vec<&ResourceDescriptor>> {
        if names.is_empty() {
            return Ok(self.resources.iter().collect());
        }
        names
            .iter()
            .map(|name| {
                self.get(name).ok_or_else(|| Error::ResourceNotFound {
                    name: name.clone(),
                })
            })
            .collect()
    }
}
