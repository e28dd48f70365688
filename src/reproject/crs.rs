//! CRS definitions and point transforms through proj4rs
//!
//! proj4rs works in radians for geographic systems; [`CrsTransform`]
//! takes and returns degrees so callers never see the difference.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use log::{info, warn};
use proj4rs::Proj;
use regex::Regex;

use crate::coordinate::CoordinateSystem;
use crate::errors::{MosaicError, MosaicResult};

/// Searched when neither the configuration nor the environment names one
pub const DEFAULT_PROJ_DATA: &str = "/usr/share/proj";

lazy_static! {
    // `<4326> +proj=longlat +datum=WGS84 +no_defs <>`
    static ref EPSG_INIT_LINE: Regex = Regex::new(r"^\s*<(\d+)>\s*(.*?)\s*<>\s*$")
        .expect("Failed to compile EPSG init line regex");
}

/// Build a projection for `crs`
///
/// When the built-in definitions do not know the code, the definition is
/// looked up in the `epsg` init file of the PROJ data directory (see
/// [`proj_data_dir`]). Failing that, it is an error. The process
/// environment is only read, never modified.
pub fn load_projection(crs: &CoordinateSystem, data_dir: Option<&Path>) -> MosaicResult<Proj> {
    let code = crs.epsg_code();
    let builtin = u16::try_from(code).ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4);

    match builtin {
        Some(definition) => Proj::from_proj_string(definition)
            .map_err(|e| MosaicError::Projection(format!("EPSG:{} definition rejected: {:?}", code, e))),
        None => {
            warn!("No built-in definition for {}, searching PROJ data", crs.authority_string());
            load_from_data_dir(code, data_dir)
        }
    }
}

/// PROJ data directory: the configured one, then `PROJ_DATA`, then the default
pub fn proj_data_dir(data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .map(PathBuf::from)
        .or_else(|| env::var_os("PROJ_DATA").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PROJ_DATA))
}

fn load_from_data_dir(code: u32, data_dir: Option<&Path>) -> MosaicResult<Proj> {
    let init_file = proj_data_dir(data_dir).join("epsg");
    let content = fs::read_to_string(&init_file).map_err(|e| MosaicError::Projection(format!(
        "EPSG:{} is unknown and {} could not be read: {}", code, init_file.display(), e)))?;

    let definition = find_epsg_definition(&content, code).ok_or_else(|| MosaicError::Projection(
        format!("EPSG:{} not found in {}", code, init_file.display())))?;

    info!("Loaded EPSG:{} from {}", code, init_file.display());
    Proj::from_proj_string(&definition)
        .map_err(|e| MosaicError::Projection(format!("EPSG:{} definition rejected: {:?}", code, e)))
}

/// PROJ string for `code` in the text of a PROJ `epsg` init file
pub fn find_epsg_definition(content: &str, code: u32) -> Option<String> {
    content.lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| EPSG_INIT_LINE.captures(line))
        .find(|caps| caps[1].parse::<u32>().ok() == Some(code))
        .map(|caps| caps[2].to_string())
}

/// Point transforms between two coordinate systems, in native units
pub struct CrsTransform {
    src: Proj,
    dst: Proj,
    src_is_geo: bool,
    dst_is_geo: bool,
}

impl CrsTransform {
    pub fn new(src: &CoordinateSystem, dst: &CoordinateSystem, data_dir: Option<&Path>) -> MosaicResult<Self> {
        let src = load_projection(src, data_dir)?;
        let dst = load_projection(dst, data_dir)?;
        let src_is_geo = src.is_latlong();
        let dst_is_geo = dst.is_latlong();
        Ok(CrsTransform { src, dst, src_is_geo, dst_is_geo })
    }

    /// Source to destination
    pub fn forward(&self, x: f64, y: f64) -> MosaicResult<(f64, f64)> {
        Self::apply(&self.src, self.src_is_geo, &self.dst, self.dst_is_geo, x, y)
    }

    /// Destination back to source
    pub fn inverse(&self, x: f64, y: f64) -> MosaicResult<(f64, f64)> {
        Self::apply(&self.dst, self.dst_is_geo, &self.src, self.src_is_geo, x, y)
    }

    fn apply(from: &Proj, from_geo: bool, to: &Proj, to_geo: bool, x: f64, y: f64) -> MosaicResult<(f64, f64)> {
        let mut point = if from_geo { (x.to_radians(), y.to_radians(), 0.0) } else { (x, y, 0.0) };

        proj4rs::transform::transform(from, to, &mut point)
            .map_err(|e| MosaicError::Projection(format!("Cannot transform ({}, {}): {:?}", x, y, e)))?;

        if !point.0.is_finite() || !point.1.is_finite() {
            return Err(MosaicError::Projection(format!("({}, {}) has no image in the target CRS", x, y)));
        }
        Ok(if to_geo { (point.0.to_degrees(), point.1.to_degrees()) } else { (point.0, point.1) })
    }
}
