//! Tile source resolution and URL templating

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{MosaicError, MosaicResult};
use crate::tiles::catalog::ProviderCatalog;
use crate::tiles::index::TileCoordinate;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(x|y|z|s|r)\}").expect("valid placeholder pattern");
    static ref ANY_PLACEHOLDER: Regex = Regex::new(r"\{([^{}]*)\}").expect("valid placeholder pattern");
}

/// Providers addressable by a short name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedProvider {
    OpenStreetMap,
    Roadmap,
    Satellite,
    Terrain,
    Hybrid,
}

impl NamedProvider {
    pub const ALL: [NamedProvider; 5] = [
        NamedProvider::OpenStreetMap,
        NamedProvider::Roadmap,
        NamedProvider::Satellite,
        NamedProvider::Terrain,
        NamedProvider::Hybrid,
    ];

    /// Case-insensitive lookup
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_uppercase();
        Self::ALL.into_iter().find(|provider| provider.name() == upper)
    }

    pub fn name(&self) -> &'static str {
        match self {
            NamedProvider::OpenStreetMap => "OPENSTREETMAP",
            NamedProvider::Roadmap => "ROADMAP",
            NamedProvider::Satellite => "SATELLITE",
            NamedProvider::Terrain => "TERRAIN",
            NamedProvider::Hybrid => "HYBRID",
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            NamedProvider::OpenStreetMap => "https://tile.openstreetmap.org/{z}/{x}/{y}.png",
            NamedProvider::Roadmap => "https://mt1.google.com/vt/lyrs=m&x={x}&y={y}&z={z}",
            NamedProvider::Satellite => "https://mt1.google.com/vt/lyrs=s&x={x}&y={y}&z={z}",
            NamedProvider::Terrain => "https://mt1.google.com/vt/lyrs=p&x={x}&y={y}&z={z}",
            NamedProvider::Hybrid => "https://mt1.google.com/vt/lyrs=y&x={x}&y={y}&z={z}",
        }
    }
}

/// Where tiles come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileSource {
    Named(NamedProvider),
    UrlTemplate(String),
}

impl TileSource {
    /// Resolve a user supplied source: built-in name, then catalog name,
    /// then a raw `http` template with `{x}`, `{y}` and `{z}`.
    pub fn resolve(source: &str, catalog: &ProviderCatalog, free_only: bool) -> MosaicResult<Self> {
        if let Some(provider) = NamedProvider::from_name(source) {
            return Ok(TileSource::Named(provider));
        }
        if let Some(entry) = catalog.get(source, free_only) {
            check_placeholders(&entry.url)?;
            return Ok(TileSource::UrlTemplate(entry.url.clone()));
        }
        if source.starts_with("http") && ["{x}", "{y}", "{z}"].iter().all(|p| source.contains(p)) {
            check_placeholders(source)?;
            return Ok(TileSource::UrlTemplate(source.to_string()));
        }

        Err(MosaicError::InputValidation(format!(
            "Unknown tile source '{}': use one of {}, a provider catalog name, or a URL template with {{x}}, {{y}} and {{z}}",
            source,
            NamedProvider::ALL.iter().map(|p| p.name()).collect::<Vec<_>>().join(", "))))
    }

    pub fn template(&self) -> &str {
        match self {
            TileSource::Named(provider) => provider.template(),
            TileSource::UrlTemplate(template) => template,
        }
    }

    /// URL of one tile
    pub fn tile_url(&self, tile: &TileCoordinate) -> String {
        PLACEHOLDER.replace_all(self.template(), |caps: &regex::Captures| {
            match &caps[1] {
                "x" => tile.x.to_string(),
                "y" => tile.y.to_string(),
                "z" => tile.zoom.to_string(),
                "s" => "a".to_string(),
                _ => String::new(),
            }
        }).into_owned()
    }
}

/// Templates may only use the placeholders `tile_url` fills in
fn check_placeholders(template: &str) -> MosaicResult<()> {
    let unknown: Vec<&str> = ANY_PLACEHOLDER.captures_iter(template)
        .filter(|caps| !PLACEHOLDER.is_match(&caps[0]))
        .filter_map(|caps| caps.get(0).map(|m| m.as_str()))
        .collect();

    match unknown.is_empty() {
        true => Ok(()),
        false => Err(MosaicError::InputValidation(format!(
            "Tile URL template {} has unresolved placeholders: {}", template, unknown.join(", ")))),
    }
}

impl fmt::Display for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileSource::Named(provider) => write!(f, "{}", provider.name()),
            TileSource::UrlTemplate(template) => write!(f, "{}", template),
        }
    }
}

/// Built-in names followed by catalog names
pub fn list_providers(catalog: &ProviderCatalog, free_only: bool) -> Vec<String> {
    NamedProvider::ALL.iter()
        .map(|p| p.name().to_string())
        .chain(catalog.names(free_only).into_iter().map(str::to_string))
        .collect()
}
