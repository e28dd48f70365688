//! Inverse-mapping raster warp
//!
//! Every destination pixel center is projected back into the source CRS
//! and sampled there; nothing is approximated between pixels.

use log::{debug, info};
use ndarray::Array2;

use crate::coordinate::{CoordinateSystem, GeoTransform};
use crate::errors::{MosaicError, MosaicResult};
use crate::raster::OutputRaster;
use crate::reproject::crs::CrsTransform;
use crate::reproject::resample::Resampling;

/// Points sampled along each edge of the source extent
pub const EDGE_SAMPLES: usize = 21;

/// Size and placement of a warped raster
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DestinationGrid {
    pub transform: GeoTransform,
    pub width: u32,
    pub height: u32,
}

/// Pixel-edge positions densifying the outline of a `width x height` raster
fn outline(width: u32, height: u32) -> Vec<(f64, f64)> {
    let (w, h) = (width as f64, height as f64);
    let steps = (EDGE_SAMPLES - 1) as f64;
    let mut points = Vec::with_capacity(EDGE_SAMPLES * 4);
    for i in 0..EDGE_SAMPLES {
        let t = i as f64 / steps;
        points.push((w * t, 0.0));
        points.push((w * t, h));
        points.push((0.0, h * t));
        points.push((w, h * t));
    }
    points
}

/// Default output grid for warping a source raster
///
/// The outline is densified, projected, and its bounding box covered with
/// square pixels sized so the diagonal keeps its pixel count.
pub fn default_grid(source: &GeoTransform, width: u32, height: u32, transform: &CrsTransform)
                    -> MosaicResult<DestinationGrid> {
    let mut bounds = (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut projected = 0usize;

    for (col, row) in outline(width, height) {
        let (sx, sy) = source.forward(col, row);
        let Ok((x, y)) = transform.forward(sx, sy) else { continue };
        bounds = (bounds.0.min(x), bounds.1.min(y), bounds.2.max(x), bounds.3.max(y));
        projected += 1;
    }

    let (min_x, min_y, max_x, max_y) = bounds;
    if projected == 0 || max_x <= min_x || max_y <= min_y {
        return Err(MosaicError::Projection(
            "Source extent has no valid footprint in the target CRS".to_string()));
    }

    let diagonal = (max_x - min_x).hypot(max_y - min_y);
    let diagonal_pixels = (width as f64).hypot(height as f64);
    let resolution = diagonal / diagonal_pixels;

    let grid = DestinationGrid {
        transform: GeoTransform::north_up(min_x, max_y, resolution, resolution),
        width: (((max_x - min_x) / resolution).round() as u32).max(1),
        height: (((max_y - min_y) / resolution).round() as u32).max(1),
    };
    debug!("Default grid {}x{} at {} units/pixel from {} outline points",
           grid.width, grid.height, resolution, projected);
    Ok(grid)
}

/// Resample every band of `raster` onto `grid` in `dst_crs`
///
/// Destination pixels with no source behind them are left at zero.
pub fn warp(raster: &OutputRaster, grid: &DestinationGrid, dst_crs: CoordinateSystem,
            transform: &CrsTransform, resampling: Resampling) -> MosaicResult<OutputRaster> {
    let to_source_pixels = raster.transform.inverse()?;
    let shape = (grid.height as usize, grid.width as usize);
    let mut bands: Vec<Array2<u8>> = (0..raster.band_count()).map(|_| Array2::zeros(shape)).collect();
    let sources: Vec<_> = raster.bands.iter().map(|band| band.view()).collect();

    info!("Warping {}x{} {} raster to {}x{} {} ({})", raster.width(), raster.height(),
          raster.crs.authority_string(), grid.width, grid.height, dst_crs.authority_string(), resampling);

    let mut filled = 0usize;
    for row in 0..shape.0 {
        for col in 0..shape.1 {
            let (dx, dy) = grid.transform.forward(col as f64 + 0.5, row as f64 + 0.5);
            let Ok((sx, sy)) = transform.inverse(dx, dy) else { continue };
            let (src_col, src_row) = to_source_pixels.forward(sx, sy);

            let mut hit = false;
            for (band, source) in bands.iter_mut().zip(&sources) {
                if let Some(value) = resampling.sample(source, src_col, src_row) {
                    band[(row, col)] = value;
                    hit = true;
                }
            }
            filled += hit as usize;
        }
    }

    debug!("{} of {} destination pixels covered", filled, shape.0 * shape.1);
    OutputRaster::new(bands, grid.transform, dst_crs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{BoundingBox, CoordinateTransformer};
    use approx::assert_relative_eq;

    fn mercator_raster(width: usize, height: usize) -> OutputRaster {
        let bbox = BoundingBox::new(-122.0, 37.0, -121.9, 37.1).unwrap();
        let transform = GeoTransform::from_bounds(bbox.to_web_mercator(), width as u32, height as u32).unwrap();
        let red = Array2::from_elem((height, width), 200u8);
        let green = Array2::from_shape_fn((height, width), |(r, _)| if r < height / 2 { 10 } else { 250 });
        let blue = Array2::from_elem((height, width), 30u8);
        OutputRaster::new(vec![red, green, blue], transform, CoordinateSystem::WebMercator).unwrap()
    }

    #[test]
    fn test_outline_covers_corners() {
        let points = outline(10, 20);
        assert_eq!(points.len(), EDGE_SAMPLES * 4);
        for corner in [(0.0, 0.0), (10.0, 0.0), (0.0, 20.0), (10.0, 20.0)] {
            assert!(points.contains(&corner));
        }
    }

    #[test]
    fn test_identity_grid_keeps_shape() {
        let square = GeoTransform::north_up(-13_580_977.0, 4_439_106.0, 100.0, 100.0);
        let raster = OutputRaster { transform: square, ..mercator_raster(64, 48) };
        let identity = CrsTransform::new(&CoordinateSystem::WebMercator, &CoordinateSystem::WebMercator, None).unwrap();
        let grid = default_grid(&raster.transform, 64, 48, &identity).unwrap();

        assert_eq!((grid.width, grid.height), (64, 48));
        assert_relative_eq!(grid.transform.origin_x, raster.transform.origin_x, epsilon = 1e-3);
        assert_relative_eq!(grid.transform.origin_y, raster.transform.origin_y, epsilon = 1e-3);
    }

    #[test]
    fn test_warp_to_wgs84_lands_on_bbox() {
        let raster = mercator_raster(80, 100);
        let to_wgs84 = CrsTransform::new(&CoordinateSystem::WebMercator, &CoordinateSystem::WGS84, None).unwrap();
        let grid = default_grid(&raster.transform, 80, 100, &to_wgs84).unwrap();
        let warped = warp(&raster, &grid, CoordinateSystem::WGS84, &to_wgs84, Resampling::Nearest).unwrap();

        let (west, south, east, north) = warped.bounds();
        assert_relative_eq!(west, -122.0, epsilon = 1e-3);
        assert_relative_eq!(north, 37.1, epsilon = 1e-3);
        assert!(east >= -121.9 - 1e-3 && south <= 37.0 + 1e-3);

        assert_eq!(warped.crs, CoordinateSystem::WGS84);
        assert_eq!(warped.band_count(), 3);
        let (rows, cols) = warped.bands[0].dim();
        assert_eq!(warped.bands[0][(rows / 2, cols / 2)], 200);
        assert_eq!(warped.bands[1][(1, cols / 2)], 10);
        assert_eq!(warped.bands[1][(rows - 2, cols / 2)], 250);
    }

    #[test]
    fn test_forward_projection_of_extent() {
        let sw = CoordinateTransformer::wgs84_to_web_mercator(-122.0, 37.0);
        let to_wgs84 = CrsTransform::new(&CoordinateSystem::WebMercator, &CoordinateSystem::WGS84, None).unwrap();
        let (lon, lat) = to_wgs84.forward(sw.x, sw.y).unwrap();
        assert_relative_eq!(lon, -122.0, epsilon = 1e-7);
        assert_relative_eq!(lat, 37.0, epsilon = 1e-7);
    }
}
