//! Named COG compression profiles

use std::fmt;

use crate::errors::{MosaicError, MosaicResult};
use crate::raster::GeoTiffOptions;
use crate::tiff::constants::compression;

/// Profiles other COG tools accept that this build cannot encode
const UNAVAILABLE_PROFILES: [&str; 8] =
    ["jpeg", "webp", "lzw", "packbits", "lzma", "lerc", "lerc_deflate", "lerc_zstd"];

/// Compression used for a COG's tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CogProfile {
    #[default]
    Deflate,
    Zstd,
    Raw,
}

impl CogProfile {
    /// Look up a profile by its case-insensitive name
    pub fn from_name(name: &str) -> MosaicResult<Self> {
        let key = name.trim().to_ascii_lowercase();
        match key.as_str() {
            "deflate" => Ok(CogProfile::Deflate),
            "zstd" if cfg!(feature = "zstd") => Ok(CogProfile::Zstd),
            "raw" | "none" => Ok(CogProfile::Raw),
            "zstd" => Err(MosaicError::MissingOptionalComponent(
                "zstd codec (rebuild with the `zstd` feature)".to_string())),
            known if UNAVAILABLE_PROFILES.contains(&known) => Err(MosaicError::MissingOptionalComponent(
                format!("'{}' COG profile encoder", known))),
            _ => Err(MosaicError::InputValidation(format!(
                "Unknown COG profile '{}', expected deflate, zstd or raw", name))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CogProfile::Deflate => "deflate",
            CogProfile::Zstd => "zstd",
            CogProfile::Raw => "raw",
        }
    }

    /// Writer settings for this profile with overviews enabled
    pub fn geotiff_options(&self, block_size: u32) -> GeoTiffOptions {
        let (code, level, predictor) = match self {
            CogProfile::Deflate => (compression::DEFLATE, Some(6), true),
            CogProfile::Zstd => (compression::ZSTD, Some(9), true),
            CogProfile::Raw => (compression::NONE, None, false),
        };
        GeoTiffOptions { block_size, compression: code, level, predictor, overviews: true }
    }
}

impl fmt::Display for CogProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
