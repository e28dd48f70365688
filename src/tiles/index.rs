//! Slippy-map tile indexing
//!
//! Converts between WGS 84 degrees and fractional XYZ tile coordinates and
//! enumerates the tiles covering a bounding box.

use std::f64::consts::PI;
use std::fmt;

use crate::coordinate::BoundingBox;
use crate::errors::{MosaicError, MosaicResult};

/// Ground resolution of zoom 0 at the equator, in metres per pixel
pub const INITIAL_RESOLUTION: f64 = 156_543.033_928_040_97;

/// Deepest zoom level a request may use
pub const MAX_ZOOM: u8 = 24;

/// Tile coordinate with fractional position inside the tile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalTile {
    pub x: f64,
    pub y: f64,
}

/// Integer tile index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// How the caller chose the tile pyramid level
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomSpec {
    Zoom(u8),
    Resolution(f64),
}

impl ZoomSpec {
    /// Exactly one of `zoom` and `resolution` must be given
    pub fn from_options(zoom: Option<u8>, resolution: Option<f64>) -> MosaicResult<Self> {
        match (zoom, resolution) {
            (Some(zoom), None) => Ok(ZoomSpec::Zoom(zoom)),
            (None, Some(resolution)) => Ok(ZoomSpec::Resolution(resolution)),
            (None, None) => Err(MosaicError::InputValidation("Either zoom or resolution must be provided".to_string())),
            (Some(_), Some(_)) => Err(MosaicError::InputValidation("Only one of zoom or resolution can be provided".to_string())),
        }
    }

    /// The zoom level this selection resolves to
    pub fn zoom(&self) -> MosaicResult<u8> {
        let zoom = match *self {
            ZoomSpec::Zoom(zoom) => zoom,
            ZoomSpec::Resolution(resolution) => resolution_to_zoom(resolution)?,
        };
        if zoom > MAX_ZOOM {
            return Err(MosaicError::InputValidation(format!("Zoom {} exceeds maximum {}", zoom, MAX_ZOOM)));
        }
        Ok(zoom)
    }
}

/// Fractional tile position of a WGS 84 point
pub fn degrees_to_tile(lat: f64, lon: f64, zoom: u8) -> FractionalTile {
    let n = 2f64.powi(zoom as i32);
    let lat_r = lat.to_radians();
    FractionalTile {
        x: (lon + 180.0) / 360.0 * n,
        y: (1.0 - (lat_r.tan() + 1.0 / lat_r.cos()).ln() / PI) / 2.0 * n,
    }
}

/// Latitude and longitude of a (possibly fractional) tile position
pub fn tile_to_degrees(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let n = 2f64.powi(zoom as i32);
    let lon = x / n * 360.0 - 180.0;
    let lat = (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    (lat, lon)
}

/// Zoom level whose native resolution is at least as fine as `resolution` metres
pub fn resolution_to_zoom(resolution: f64) -> MosaicResult<u8> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(MosaicError::InputValidation(format!("Resolution must be a positive number, got {}", resolution)));
    }
    let zoom = (INITIAL_RESOLUTION / resolution).log2().floor();
    Ok(zoom.clamp(0.0, MAX_ZOOM as f64) as u8)
}

/// The tiles covering a bounding box at one zoom level
#[derive(Debug, Clone, PartialEq)]
pub struct TileRange {
    pub zoom: u8,
    /// Fractional extent of the bbox: `x0 < x1`, `y0 < y1`
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    /// Integer tile columns `[x_min, x_max)`
    pub x_min: u32,
    pub x_max: u32,
    /// Integer tile rows `[y_min, y_max)`
    pub y_min: u32,
    pub y_max: u32,
}

impl TileRange {
    pub fn covering(bbox: &BoundingBox, zoom: u8) -> Self {
        let a = degrees_to_tile(bbox.south, bbox.west, zoom);
        let b = degrees_to_tile(bbox.north, bbox.east, zoom);
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));

        let limit = 2f64.powi(zoom as i32);
        let clamp = |v: f64| v.clamp(0.0, limit) as u32;

        let mut range = TileRange {
            zoom,
            x0, y0, x1, y1,
            x_min: clamp(x0.floor()),
            x_max: clamp(x1.ceil()),
            y_min: clamp(y0.floor()),
            y_max: clamp(y1.ceil()),
        };
        // A degenerate extent still needs one tile
        if range.x_max <= range.x_min {
            range.x_max = range.x_min + 1;
        }
        if range.y_max <= range.y_min {
            range.y_max = range.y_min + 1;
        }
        range
    }

    pub fn columns(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn rows(&self) -> u32 {
        self.y_max - self.y_min
    }

    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tiles in row-major order: rows top to bottom, columns left to right
    pub fn iter(&self) -> impl Iterator<Item = TileCoordinate> + '_ {
        (self.y_min..self.y_max)
            .flat_map(move |y| (self.x_min..self.x_max).map(move |x| TileCoordinate { x, y, zoom: self.zoom }))
    }
}
