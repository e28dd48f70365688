//! Resampling kernels for 8-bit bands
//!
//! Coordinates follow the GDAL corner convention: pixel `(0, 0)` spans
//! `[0, 1) x [0, 1)` and its center sits at `(0.5, 0.5)`.

use std::fmt;

use ndarray::ArrayView2;

use crate::errors::{MosaicError, MosaicResult};

/// How destination pixels are filled from the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resampling {
    #[default]
    Nearest,
    Bilinear,
}

impl Resampling {
    pub fn from_name(name: &str) -> MosaicResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "nearest" | "near" => Ok(Resampling::Nearest),
            "bilinear" => Ok(Resampling::Bilinear),
            other => Err(MosaicError::InputValidation(format!(
                "Unknown resampling method '{}', expected nearest or bilinear", other))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Resampling::Nearest => "nearest",
            Resampling::Bilinear => "bilinear",
        }
    }

    /// Value at source pixel coordinate `(x, y)`, `None` outside the band
    pub fn sample(&self, band: &ArrayView2<'_, u8>, x: f64, y: f64) -> Option<u8> {
        match self {
            Resampling::Nearest => nearest(band, x, y),
            Resampling::Bilinear => bilinear(band, x, y),
        }
    }
}

impl fmt::Display for Resampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn inside(band: &ArrayView2<'_, u8>, x: f64, y: f64) -> bool {
    x >= 0.0 && y >= 0.0 && x < band.ncols() as f64 && y < band.nrows() as f64
}

fn nearest(band: &ArrayView2<'_, u8>, x: f64, y: f64) -> Option<u8> {
    if !inside(band, x, y) {
        return None;
    }
    Some(band[(y.floor() as usize, x.floor() as usize)])
}

/// 2x2 interpolation between pixel centers; neighbors past the border
/// are clamped onto the edge pixels.
fn bilinear(band: &ArrayView2<'_, u8>, x: f64, y: f64) -> Option<u8> {
    if !inside(band, x, y) {
        return None;
    }

    let (max_col, max_row) = ((band.ncols() - 1) as f64, (band.nrows() - 1) as f64);
    let cx = (x - 0.5).clamp(0.0, max_col);
    let cy = (y - 0.5).clamp(0.0, max_row);

    let (x0, y0) = (cx.floor() as usize, cy.floor() as usize);
    let x1 = (x0 + 1).min(band.ncols() - 1);
    let y1 = (y0 + 1).min(band.nrows() - 1);
    let (dx, dy) = (cx - x0 as f64, cy - y0 as f64);

    let value = band[(y0, x0)] as f64 * (1.0 - dx) * (1.0 - dy)
        + band[(y0, x1)] as f64 * dx * (1.0 - dy)
        + band[(y1, x0)] as f64 * (1.0 - dx) * dy
        + band[(y1, x1)] as f64 * dx * dy;

    Some(value.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_nearest_uses_containing_pixel() {
        let band = array![[1u8, 2], [3, 4]];
        let view = band.view();
        assert_eq!(Resampling::Nearest.sample(&view, 0.5, 0.5), Some(1));
        assert_eq!(Resampling::Nearest.sample(&view, 1.99, 0.1), Some(2));
        assert_eq!(Resampling::Nearest.sample(&view, 0.0, 1.0), Some(3));
        assert_eq!(Resampling::Nearest.sample(&view, 2.0, 0.5), None);
        assert_eq!(Resampling::Nearest.sample(&view, -0.01, 0.5), None);
    }

    #[test]
    fn test_bilinear_interpolates_between_centers() {
        let band = array![[0u8, 100], [100, 200]];
        let view = band.view();
        assert_eq!(Resampling::Bilinear.sample(&view, 0.5, 0.5), Some(0));
        assert_eq!(Resampling::Bilinear.sample(&view, 1.0, 1.0), Some(100));
        assert_eq!(Resampling::Bilinear.sample(&view, 1.0, 0.5), Some(50));
        // Clamped onto the edge pixel
        assert_eq!(Resampling::Bilinear.sample(&view, 1.9, 1.9), Some(200));
        assert_eq!(Resampling::Bilinear.sample(&view, 0.5, 2.5), None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Resampling::from_name("Bilinear").unwrap(), Resampling::Bilinear);
        assert_eq!(Resampling::from_name("near").unwrap(), Resampling::Nearest);
        assert!(Resampling::from_name("cubic").is_err());
    }
}
