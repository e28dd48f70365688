//! Catalog of third-party XYZ tile providers
//!
//! A catalog ships inside the binary (`providers.toml`) and can be replaced
//! by a file of the same shape at runtime.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use lazy_static::lazy_static;
use log::{debug, warn};

use crate::errors::{MosaicError, MosaicResult};

lazy_static! {
    static ref BUILTIN_CATALOG: ProviderCatalog = {
        let content = include_str!("../../providers.toml");
        ProviderCatalog::from_toml(content).unwrap_or_else(|e| {
            warn!("Failed to parse built-in provider catalog: {}", e);
            ProviderCatalog::default()
        })
    };
}

/// One tile provider
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEntry {
    pub name: String,
    pub url: String,
    pub attribution: Option<String>,
    pub max_zoom: Option<u8>,
    pub requires_token: bool,
}

/// Named tile providers, ordered by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderCatalog {
    entries: BTreeMap<String, ProviderEntry>,
}

impl ProviderCatalog {
    /// The catalog compiled into the crate
    pub fn builtin() -> &'static ProviderCatalog {
        &BUILTIN_CATALOG
    }

    /// Load a catalog file
    pub fn load(path: &Path) -> MosaicResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| MosaicError::Config(format!(
            "Cannot read provider catalog {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Parse `[providers."Name"]` tables
    pub fn from_toml(content: &str) -> MosaicResult<Self> {
        let value: toml::Value = content.parse()
            .map_err(|e| MosaicError::Config(format!("Failed to parse provider catalog: {}", e)))?;

        let mut catalog = ProviderCatalog::default();
        let Some(table) = value.get("providers").and_then(|v| v.as_table()) else {
            return Ok(catalog);
        };

        for (name, entry) in table {
            let Some(url) = entry.get("url").and_then(|v| v.as_str()) else {
                warn!("Provider '{}' has no url, skipping", name);
                continue;
            };

            let max_zoom = entry.get("max_zoom")
                .and_then(|v| v.as_integer())
                .and_then(|z| u8::try_from(z).ok());

            catalog.entries.insert(name.clone(), ProviderEntry {
                name: name.clone(),
                url: url.to_string(),
                attribution: entry.get("attribution").and_then(|v| v.as_str()).map(str::to_string),
                max_zoom,
                requires_token: entry.get("requires_token").and_then(|v| v.as_bool()).unwrap_or(false),
            });
        }

        debug!("Loaded {} tile providers", catalog.entries.len());
        Ok(catalog)
    }

    /// Look up a provider by exact name
    pub fn get(&self, name: &str, free_only: bool) -> Option<&ProviderEntry> {
        self.entries.get(name).filter(|entry| !(free_only && entry.requires_token))
    }

    /// Provider names in order
    pub fn names(&self, free_only: bool) -> Vec<&str> {
        self.entries.values()
            .filter(|entry| !(free_only && entry.requires_token))
            .map(|entry| entry.name.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [providers."Free.Map"]
        url = "https://tiles.example.com/{z}/{x}/{y}.png"
        max_zoom = 18

        [providers."Paid.Map"]
        url = "https://paid.example.com/{z}/{x}/{y}.png?key={key}"
        requires_token = true

        [providers."Broken"]
        attribution = "no url"
    "#;

    #[test]
    fn test_parse_and_filter() {
        let catalog = ProviderCatalog::from_toml(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.names(true), vec!["Free.Map"]);
        assert_eq!(catalog.names(false), vec!["Free.Map", "Paid.Map"]);
        assert!(catalog.get("Paid.Map", true).is_none());
        assert_eq!(catalog.get("Free.Map", true).unwrap().max_zoom, Some(18));
    }

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = ProviderCatalog::builtin();
        assert!(!catalog.is_empty());
        assert!(catalog.get("Esri.WorldImagery", true).is_some());
        assert!(catalog.names(true).iter().all(|name| !name.starts_with("Stadia")));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(ProviderCatalog::from_toml("[providers"), Err(MosaicError::Config(_))));
    }
}
