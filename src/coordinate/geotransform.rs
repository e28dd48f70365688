//! Affine pixel-to-world transforms in GDAL ordering

use std::fmt;

use crate::errors::{MosaicError, MosaicResult};

/// Maps pixel `(col, row)` to world `(x, y)`:
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// `pixel_height` is negative for north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform from the upper-left corner and positive pixel sizes
    pub fn north_up(min_x: f64, max_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform {
            origin_x: min_x,
            pixel_width,
            row_rotation: 0.0,
            origin_y: max_y,
            col_rotation: 0.0,
            pixel_height: -pixel_height,
        }
    }

    /// Transform covering `(min_x, min_y, max_x, max_y)` with `width x height` pixels
    pub fn from_bounds(bounds: (f64, f64, f64, f64), width: u32, height: u32) -> MosaicResult<Self> {
        let (min_x, min_y, max_x, max_y) = bounds;
        if width == 0 || height == 0 {
            return Err(MosaicError::InputValidation("Raster dimensions must be positive".to_string()));
        }
        let pixel_width = (max_x - min_x).abs() / width as f64;
        let pixel_height = (max_y - min_y).abs() / height as f64;
        Ok(Self::north_up(min_x.min(max_x), max_y.max(min_y), pixel_width, pixel_height))
    }

    pub fn from_gdal(gt: &[f64; 6]) -> Self {
        GeoTransform {
            origin_x: gt[0],
            pixel_width: gt[1],
            row_rotation: gt[2],
            origin_y: gt[3],
            col_rotation: gt[4],
            pixel_height: gt[5],
        }
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [self.origin_x, self.pixel_width, self.row_rotation,
         self.origin_y, self.col_rotation, self.pixel_height]
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0 && self.pixel_height < 0.0
    }

    /// Pixel (possibly fractional) to world coordinates
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.origin_x + col * self.pixel_width + row * self.row_rotation,
            self.origin_y + col * self.col_rotation + row * self.pixel_height,
        )
    }

    /// The world-to-pixel transform
    pub fn inverse(&self) -> MosaicResult<GeoTransform> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;
        if det.abs() < f64::EPSILON {
            return Err(MosaicError::Projection("Singular geotransform".to_string()));
        }
        let inv = 1.0 / det;
        Ok(GeoTransform {
            origin_x: (self.row_rotation * self.origin_y - self.pixel_height * self.origin_x) * inv,
            pixel_width: self.pixel_height * inv,
            row_rotation: -self.row_rotation * inv,
            origin_y: (self.col_rotation * self.origin_x - self.pixel_width * self.origin_y) * inv,
            col_rotation: -self.col_rotation * inv,
            pixel_height: self.pixel_width * inv,
        })
    }

    /// World extent of a `width x height` raster: `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self, width: u32, height: u32) -> (f64, f64, f64, f64) {
        let corners = [
            self.forward(0.0, 0.0),
            self.forward(width as f64, 0.0),
            self.forward(0.0, height as f64),
            self.forward(width as f64, height as f64),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y)),
        )
    }
}

impl fmt::Display for GeoTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {}, {}, {}, {})",
               self.origin_x, self.pixel_width, self.row_rotation,
               self.origin_y, self.col_rotation, self.pixel_height)
    }
}
