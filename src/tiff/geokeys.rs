//! GeoKey directory encoding and parsing
//!
//! The GeoKey directory is a SHORT array: a four value header
//! (version, revision, minor revision, key count) followed by one
//! `(key id, tag location, count, value/offset)` quadruple per key.
//! Location 0 means the value is stored in the quadruple itself, location
//! 34737 points into the GeoAsciiParams string.

use log::debug;

use crate::coordinate::CoordinateSystem;
use crate::tiff::constants::{geo_keys, tags};
use crate::tiff::errors::{TiffError, TiffResult};

/// One key of the GeoKey directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    pub key_id: u16,
    pub location: u16,
    pub count: u16,
    pub value: u16,
}

impl GeoKeyEntry {
    fn short(key_id: u16, value: u16) -> Self {
        GeoKeyEntry { key_id, location: 0, count: 1, value }
    }
}

/// Encoded GeoKey directory plus the ASCII parameters it references
#[derive(Debug, Clone, PartialEq)]
pub struct GeoKeyDirectory {
    pub keys: Vec<GeoKeyEntry>,
    pub ascii_params: String,
}

impl GeoKeyDirectory {
    /// Builds the directory describing `crs`
    pub fn for_crs(crs: &CoordinateSystem) -> TiffResult<Self> {
        let code = u16::try_from(crs.epsg_code()).map_err(|_| TiffError::GenericError(format!(
            "EPSG:{} cannot be stored in a GeoKey directory", crs.epsg_code())))?;

        let citation = format!("{}|", crs.citation());
        let citation_key = GeoKeyEntry {
            key_id: geo_keys::GT_CITATION,
            location: tags::GEO_ASCII_PARAMS_TAG,
            count: citation.len() as u16,
            value: 0,
        };

        let mut keys = vec![
            GeoKeyEntry::short(geo_keys::GT_RASTER_TYPE, geo_keys::RASTER_PIXEL_IS_AREA),
            citation_key,
        ];

        if crs.is_geographic() {
            keys.push(GeoKeyEntry::short(geo_keys::GT_MODEL_TYPE, geo_keys::MODEL_TYPE_GEOGRAPHIC));
            keys.push(GeoKeyEntry::short(geo_keys::GEOGRAPHIC_TYPE, code));
            keys.push(GeoKeyEntry::short(geo_keys::GEOG_ANGULAR_UNITS, geo_keys::ANGULAR_UNIT_DEGREE));
        } else {
            keys.push(GeoKeyEntry::short(geo_keys::GT_MODEL_TYPE, geo_keys::MODEL_TYPE_PROJECTED));
            keys.push(GeoKeyEntry::short(geo_keys::PROJECTED_CS_TYPE, code));
            keys.push(GeoKeyEntry::short(geo_keys::PROJ_LINEAR_UNITS, geo_keys::LINEAR_UNIT_METRE));
        }

        keys.sort_by_key(|k| k.key_id);
        Ok(GeoKeyDirectory { keys, ascii_params: citation })
    }

    /// Flattens the directory into the SHORT array stored in tag 34735
    pub fn to_shorts(&self) -> Vec<u16> {
        let [version, revision, minor] = geo_keys::DIRECTORY_VERSION;
        let mut shorts = vec![version, revision, minor, self.keys.len() as u16];
        for key in &self.keys {
            shorts.extend_from_slice(&[key.key_id, key.location, key.count, key.value]);
        }
        shorts
    }

    /// Parses the SHORT array of tag 34735
    pub fn from_shorts(shorts: &[u64]) -> TiffResult<Vec<GeoKeyEntry>> {
        if shorts.len() < 4 {
            return Err(TiffError::GenericError("Invalid GeoKey directory header".to_string()));
        }

        let key_count = shorts[3] as usize;
        if shorts.len() < 4 + key_count * 4 {
            return Err(TiffError::GenericError(format!(
                "GeoKey directory declares {} keys but holds {} values", key_count, shorts.len())));
        }

        let keys = shorts[4..4 + key_count * 4]
            .chunks_exact(4)
            .map(|k| GeoKeyEntry {
                key_id: k[0] as u16,
                location: k[1] as u16,
                count: k[2] as u16,
                value: k[3] as u16,
            })
            .collect::<Vec<_>>();

        debug!("Parsed {} GeoKeys", keys.len());
        Ok(keys)
    }

    /// Recovers the EPSG code of a parsed directory.
    ///
    /// A projected CS key wins over a geographic one; user-defined (32767)
    /// codes are rejected because they carry no EPSG identity.
    pub fn epsg_code(keys: &[GeoKeyEntry]) -> TiffResult<u32> {
        let inline_value = |id: u16| {
            keys.iter()
                .find(|k| k.key_id == id && k.location == 0)
                .map(|k| k.value)
        };

        let code = inline_value(geo_keys::PROJECTED_CS_TYPE)
            .or_else(|| inline_value(geo_keys::GEOGRAPHIC_TYPE))
            .ok_or(TiffError::MissingGeoreference("no EPSG code in GeoKey directory"))?;

        if code == 0 || code == 32767 {
            return Err(TiffError::MissingGeoreference("user-defined CRS in GeoKey directory"));
        }
        Ok(code as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_web_mercator_directory_round_trips_epsg() {
        let dir = GeoKeyDirectory::for_crs(&CoordinateSystem::WebMercator).unwrap();
        let shorts: Vec<u64> = dir.to_shorts().into_iter().map(u64::from).collect();

        assert_eq!(shorts[3] as usize, dir.keys.len());
        let keys = GeoKeyDirectory::from_shorts(&shorts).unwrap();
        assert_eq!(GeoKeyDirectory::epsg_code(&keys).unwrap(), 3857);
        assert!(dir.ascii_params.ends_with('|'));
    }

    #[test]
    fn test_geographic_directory_uses_geographic_model() {
        let dir = GeoKeyDirectory::for_crs(&CoordinateSystem::WGS84).unwrap();
        let model = dir.keys.iter().find(|k| k.key_id == geo_keys::GT_MODEL_TYPE).unwrap();
        assert_eq!(model.value, geo_keys::MODEL_TYPE_GEOGRAPHIC);
        assert_eq!(GeoKeyDirectory::epsg_code(&dir.keys).unwrap(), 4326);
    }

    #[test]
    fn test_other_geographic_code_uses_geographic_keys() {
        let dir = GeoKeyDirectory::for_crs(&CoordinateSystem::Other(4269)).unwrap();
        let value = |id: u16| dir.keys.iter().find(|k| k.key_id == id).map(|k| k.value);
        assert_eq!(value(geo_keys::GT_MODEL_TYPE), Some(geo_keys::MODEL_TYPE_GEOGRAPHIC));
        assert_eq!(value(geo_keys::GEOGRAPHIC_TYPE), Some(4269));
        assert_eq!(value(geo_keys::PROJECTED_CS_TYPE), None);
    }

    #[test]
    fn test_keys_are_sorted() {
        let dir = GeoKeyDirectory::for_crs(&CoordinateSystem::UTM(33, true)).unwrap();
        let ids: Vec<u16> = dir.keys.iter().map(|k| k.key_id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_truncated_directory_is_rejected() {
        assert!(GeoKeyDirectory::from_shorts(&[1, 1, 0, 2, 1024, 0, 1, 1]).is_err());
    }
}
