//! Runtime configuration
//!
//! Everything is optional; a missing file section falls back to the
//! defaults below. Values of the wrong type or out of range are
//! [`MosaicError::Config`] errors rather than silently ignored.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, LevelFilter};

use crate::errors::{MosaicError, MosaicResult};
use crate::raster::GeoTiffOptions;
use crate::tiles::{FetchPolicy, ProviderCatalog, DEFAULT_USER_AGENT};
use crate::utils::Logger;

/// `[fetch]`
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub workers: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            workers: 5,
            timeout_secs: 60,
            max_attempts: 3,
            retry_delay_ms: 250,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub block_size: u32,
    pub deflate_level: i32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { block_size: 256, deflate_level: 9 }
    }
}

/// `[cog]`
#[derive(Debug, Clone, PartialEq)]
pub struct CogConfig {
    pub block_size: u32,
    pub profile: String,
}

impl Default for CogConfig {
    fn default() -> Self {
        CogConfig { block_size: 512, profile: "deflate".to_string() }
    }
}

/// `[catalog]`
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    pub path: Option<PathBuf>,
    pub free_only: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig { path: None, free_only: true }
    }
}

/// `[projection]`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionConfig {
    pub data_dir: Option<PathBuf>,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { file: None, level: "info".to_string() }
    }
}

impl LoggingConfig {
    pub fn level_filter(&self) -> LevelFilter {
        Logger::parse_level(&self.level)
    }
}

/// All configuration sections
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MosaicConfig {
    pub fetch: FetchConfig,
    pub output: OutputConfig,
    pub cog: CogConfig,
    pub catalog: CatalogConfig,
    pub projection: ProjectionConfig,
    pub logging: LoggingConfig,
}

impl MosaicConfig {
    /// Read a TOML configuration file
    pub fn load(path: &Path) -> MosaicResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| MosaicError::Config(format!(
            "Cannot read configuration {}: {}", path.display(), e)))?;
        debug!("Loaded configuration from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> MosaicResult<Self> {
        let value: toml::Value = content.parse()
            .map_err(|e| MosaicError::Config(format!("Failed to parse configuration: {}", e)))?;

        let mut config = MosaicConfig::default();

        let fetch = Section::new(&value, "fetch");
        if let Some(workers) = fetch.positive("workers")? {
            config.fetch.workers = workers as usize;
        }
        if let Some(timeout) = fetch.positive("timeout_secs")? {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(attempts) = fetch.positive("max_attempts")? {
            config.fetch.max_attempts = u32::try_from(attempts).map_err(|_| fetch.invalid("max_attempts"))?;
        }
        if let Some(delay) = fetch.unsigned("retry_delay_ms")? {
            config.fetch.retry_delay_ms = delay;
        }
        if let Some(agent) = fetch.string("user_agent")? {
            config.fetch.user_agent = agent;
        }

        let output = Section::new(&value, "output");
        if let Some(block) = output.block_size("block_size")? {
            config.output.block_size = block;
        }
        if let Some(level) = output.unsigned("deflate_level")? {
            if level > 9 {
                return Err(output.invalid("deflate_level"));
            }
            config.output.deflate_level = level as i32;
        }

        let cog = Section::new(&value, "cog");
        if let Some(block) = cog.block_size("block_size")? {
            config.cog.block_size = block;
        }
        if let Some(profile) = cog.string("profile")? {
            config.cog.profile = profile;
        }

        let catalog = Section::new(&value, "catalog");
        config.catalog.path = catalog.string("path")?.map(PathBuf::from);
        if let Some(free_only) = catalog.boolean("free_only")? {
            config.catalog.free_only = free_only;
        }

        let projection = Section::new(&value, "projection");
        config.projection.data_dir = projection.string("data_dir")?.map(PathBuf::from);

        let logging = Section::new(&value, "logging");
        config.logging.file = logging.string("file")?.map(PathBuf::from);
        if let Some(level) = logging.string("level")? {
            config.logging.level = level;
        }

        Ok(config)
    }

    pub fn fetch_policy(&self) -> FetchPolicy {
        FetchPolicy {
            workers: self.fetch.workers,
            max_attempts: self.fetch.max_attempts,
            retry_delay: Duration::from_millis(self.fetch.retry_delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.fetch.timeout_secs)
    }

    /// Settings for the base GeoTIFF of a mosaic
    pub fn geotiff_options(&self) -> GeoTiffOptions {
        GeoTiffOptions {
            block_size: self.output.block_size,
            level: Some(self.output.deflate_level),
            ..GeoTiffOptions::default()
        }
    }

    /// The configured provider catalog, or the built-in one
    pub fn provider_catalog(&self) -> MosaicResult<ProviderCatalog> {
        match &self.catalog.path {
            Some(path) => ProviderCatalog::load(path),
            None => Ok(ProviderCatalog::builtin().clone()),
        }
    }
}

/// Typed lookups in one table of the configuration
struct Section<'a> {
    name: &'static str,
    table: Option<&'a toml::value::Table>,
}

impl<'a> Section<'a> {
    fn new(root: &'a toml::Value, name: &'static str) -> Self {
        Section { name, table: root.get(name).and_then(|v| v.as_table()) }
    }

    fn invalid(&self, key: &str) -> MosaicError {
        MosaicError::Config(format!("Invalid value for {}.{}", self.name, key))
    }

    fn get(&self, key: &str) -> Option<&'a toml::Value> {
        self.table.and_then(|table| table.get(key))
    }

    fn unsigned(&self, key: &str) -> MosaicResult<Option<u64>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_integer()
                .and_then(|v| u64::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(key)),
        }
    }

    fn positive(&self, key: &str) -> MosaicResult<Option<u64>> {
        match self.unsigned(key)? {
            Some(0) => Err(self.invalid(key)),
            other => Ok(other),
        }
    }

    fn block_size(&self, key: &str) -> MosaicResult<Option<u32>> {
        match self.positive(key)? {
            None => Ok(None),
            Some(block) if block % 16 == 0 && block <= 4096 => Ok(Some(block as u32)),
            Some(_) => Err(self.invalid(key)),
        }
    }

    fn string(&self, key: &str) -> MosaicResult<Option<String>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_str().map(|s| Some(s.to_string())).ok_or_else(|| self.invalid(key)),
        }
    }

    fn boolean(&self, key: &str) -> MosaicResult<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| self.invalid(key)),
        }
    }
}
