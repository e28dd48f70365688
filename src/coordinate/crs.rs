//! Coordinate Reference System handling

use crate::errors::{MosaicError, MosaicResult};

/// Identifier for common coordinate systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    /// WGS 84 (EPSG:4326)
    WGS84,
    /// Web Mercator (EPSG:3857)
    #[default]
    WebMercator,
    /// UTM Zone (EPSG:326xx for northern hemisphere, 327xx for southern)
    UTM(u8, bool),
    /// Other EPSG code
    Other(u32),
}

impl CoordinateSystem {
    /// Get the EPSG code for this coordinate system
    pub fn epsg_code(&self) -> u32 {
        match self {
            CoordinateSystem::WGS84 => 4326,
            CoordinateSystem::WebMercator => 3857,
            CoordinateSystem::UTM(zone, is_northern) => {
                if *is_northern {
                    32600 + *zone as u32
                } else {
                    32700 + *zone as u32
                }
            },
            CoordinateSystem::Other(code) => *code,
        }
    }

    /// `EPSG:<code>`, the form proj4rs accepts as a user string
    pub fn authority_string(&self) -> String {
        format!("EPSG:{}", self.epsg_code())
    }

    /// Get a description of this coordinate system
    pub fn description(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84 (EPSG:4326)".to_string(),
            CoordinateSystem::WebMercator => "Web Mercator (EPSG:3857)".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { 'N' } else { 'S' };
                format!("UTM Zone {}{} (EPSG:{})", zone, hemisphere, self.epsg_code())
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }

    /// Citation written to the GeoTIFF ASCII parameters
    pub fn citation(&self) -> String {
        match self {
            CoordinateSystem::WGS84 => "WGS 84".to_string(),
            CoordinateSystem::WebMercator => "WGS 84 / Pseudo-Mercator".to_string(),
            CoordinateSystem::UTM(zone, is_northern) => {
                let hemisphere = if *is_northern { 'N' } else { 'S' };
                format!("WGS 84 / UTM zone {}{}", zone, hemisphere)
            },
            CoordinateSystem::Other(code) => format!("EPSG:{}", code),
        }
    }

    /// Whether coordinates are longitude/latitude degrees.
    ///
    /// Other EPSG codes are geographic when their definition is a
    /// `longlat` projection.
    pub fn is_geographic(&self) -> bool {
        match self {
            CoordinateSystem::WGS84 => true,
            CoordinateSystem::WebMercator | CoordinateSystem::UTM(..) => false,
            CoordinateSystem::Other(code) => is_longlat_code(*code),
        }
    }
}

#[cfg(feature = "reproject")]
fn is_longlat_code(code: u32) -> bool {
    u16::try_from(code).ok()
        .and_then(crs_definitions::from_code)
        .is_some_and(|def| def.proj4.contains("+proj=longlat"))
}

/// Without the definition table, the EPSG geographic 2D block
#[cfg(not(feature = "reproject"))]
fn is_longlat_code(code: u32) -> bool {
    (4001..=4999).contains(&code)
}

/// Factory for creating coordinate systems
pub struct CoordinateSystemFactory;

impl CoordinateSystemFactory {
    /// Create a coordinate system from an EPSG code
    pub fn from_epsg(epsg: u32) -> MosaicResult<CoordinateSystem> {
        match epsg {
            0 => Err(MosaicError::InputValidation("EPSG code 0 is not valid".to_string())),
            4326 => Ok(CoordinateSystem::WGS84),
            3857 | 900913 => Ok(CoordinateSystem::WebMercator),
            32601..=32660 => Ok(CoordinateSystem::UTM((epsg - 32600) as u8, true)),
            32701..=32760 => Ok(CoordinateSystem::UTM((epsg - 32700) as u8, false)),
            _ => Ok(CoordinateSystem::Other(epsg)),
        }
    }

    /// Parse a coordinate system from a string (e.g. "EPSG:4326" or "4326")
    pub fn from_string(crs_str: &str) -> MosaicResult<CoordinateSystem> {
        let crs_str = crs_str.trim().to_uppercase();
        let code = crs_str.strip_prefix("EPSG:").unwrap_or(&crs_str);

        match code.parse::<u32>() {
            Ok(epsg) => Self::from_epsg(epsg),
            Err(_) => Err(MosaicError::InputValidation(format!("Unsupported CRS format: {}", crs_str))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        assert_eq!(CoordinateSystemFactory::from_string("EPSG:3857").unwrap(), CoordinateSystem::WebMercator);
        assert_eq!(CoordinateSystemFactory::from_string(" epsg:4326 ").unwrap(), CoordinateSystem::WGS84);
        assert_eq!(CoordinateSystemFactory::from_string("32633").unwrap(), CoordinateSystem::UTM(33, true));
        assert_eq!(CoordinateSystemFactory::from_string("EPSG:2056").unwrap(), CoordinateSystem::Other(2056));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(CoordinateSystemFactory::from_string("mercator").is_err());
        assert!(CoordinateSystemFactory::from_string("EPSG:").is_err());
        assert!(CoordinateSystemFactory::from_string("EPSG:0").is_err());
    }

    #[test]
    fn test_geographic_detection() {
        assert!(CoordinateSystem::WGS84.is_geographic());
        assert!(CoordinateSystem::Other(4269).is_geographic());
        assert!(CoordinateSystem::Other(4258).is_geographic());
        assert!(!CoordinateSystem::Other(2056).is_geographic());
        assert!(!CoordinateSystem::UTM(33, true).is_geographic());
    }

    #[test]
    fn test_utm_south_code() {
        assert_eq!(CoordinateSystem::UTM(56, false).epsg_code(), 32756);
        assert_eq!(CoordinateSystem::UTM(56, false).authority_string(), "EPSG:32756");
    }
}
