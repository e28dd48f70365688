//! Band-separated georeferenced raster held in memory

use image::{DynamicImage, RgbImage, RgbaImage};
use ndarray::{s, Array2};

use crate::coordinate::{CoordinateSystem, GeoTransform};
use crate::errors::{MosaicError, MosaicResult};

/// A georeferenced 8-bit raster: one `(rows, cols)` array per band
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRaster {
    pub bands: Vec<Array2<u8>>,
    pub transform: GeoTransform,
    pub crs: CoordinateSystem,
}

impl OutputRaster {
    /// Assemble a raster, checking that all bands share one shape
    pub fn new(bands: Vec<Array2<u8>>, transform: GeoTransform, crs: CoordinateSystem) -> MosaicResult<Self> {
        let shape = match bands.first() {
            Some(band) => band.dim(),
            None => return Err(MosaicError::InputValidation("Raster has no bands".to_string())),
        };
        if bands.len() > 4 {
            return Err(MosaicError::InputValidation(format!("Unsupported band count {}", bands.len())));
        }
        if shape.0 == 0 || shape.1 == 0 {
            return Err(MosaicError::InputValidation("Raster has zero dimensions".to_string()));
        }
        if bands.iter().any(|band| band.dim() != shape) {
            return Err(MosaicError::InputValidation("Raster bands differ in shape".to_string()));
        }

        Ok(OutputRaster { bands, transform, crs })
    }

    /// Split an RGB or RGBA image into bands
    pub fn from_image(image: &DynamicImage, transform: GeoTransform, crs: CoordinateSystem) -> MosaicResult<Self> {
        let (channels, width, height, raw) = match image {
            DynamicImage::ImageRgba8(rgba) => (4, rgba.width(), rgba.height(), rgba.as_raw().as_slice()),
            DynamicImage::ImageRgb8(rgb) => (3, rgb.width(), rgb.height(), rgb.as_raw().as_slice()),
            other => {
                let converted = if other.color().has_alpha() {
                    DynamicImage::ImageRgba8(other.to_rgba8())
                } else {
                    DynamicImage::ImageRgb8(other.to_rgb8())
                };
                return Self::from_image(&converted, transform, crs);
            }
        };

        let shape = (height as usize, width as usize);
        let bands = (0..channels)
            .map(|band| Array2::from_shape_fn(shape, |(row, col)| raw[(row * shape.1 + col) * channels + band]))
            .collect();
        Self::new(bands, transform, crs)
    }

    /// Interleave the bands back into an image
    pub fn to_image(&self) -> MosaicResult<DynamicImage> {
        let (width, height) = (self.width(), self.height());
        let data = self.interleave_window(0, 0, width, height);

        let image = match self.band_count() {
            3 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            4 => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
            n => return Err(MosaicError::InputValidation(format!("Cannot build an image from {} bands", n))),
        };
        image.ok_or_else(|| MosaicError::Decode("Raster buffer does not match its dimensions".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.bands[0].ncols() as u32
    }

    pub fn height(&self) -> u32 {
        self.bands[0].nrows() as u32
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// The last band is alpha for gray+alpha and RGBA rasters
    pub fn has_alpha(&self) -> bool {
        matches!(self.band_count(), 2 | 4)
    }

    /// World extent: `(min_x, min_y, max_x, max_y)`
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.transform.bounds(self.width(), self.height())
    }

    /// Chunky bytes of a `width x height` window, zero filled past the edges
    pub fn interleave_window(&self, x0: u32, y0: u32, width: u32, height: u32) -> Vec<u8> {
        let samples = self.band_count();
        let (rows, cols) = (self.height() as usize, self.width() as usize);
        let mut data = vec![0u8; width as usize * height as usize * samples];

        for dy in 0..height as usize {
            let row = y0 as usize + dy;
            if row >= rows {
                break;
            }
            for dx in 0..width as usize {
                let col = x0 as usize + dx;
                if col >= cols {
                    break;
                }
                let base = (dy * width as usize + dx) * samples;
                for (band_index, band) in self.bands.iter().enumerate() {
                    data[base + band_index] = band[[row, col]];
                }
            }
        }
        data
    }

    /// Half resolution copy by nearest decimation
    pub fn decimate(&self) -> OutputRaster {
        let bands = self.bands.iter()
            .map(|band| band.slice(s![..;2, ..;2]).to_owned())
            .collect();

        let mut transform = self.transform;
        transform.pixel_width *= 2.0;
        transform.pixel_height *= 2.0;
        transform.row_rotation *= 2.0;
        transform.col_rotation *= 2.0;

        OutputRaster { bands, transform, crs: self.crs }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn transform() -> GeoTransform {
        GeoTransform::north_up(0.0, 100.0, 1.0, 1.0)
    }

    #[test]
    fn test_image_round_trip_keeps_alpha() {
        let mut image = RgbaImage::new(3, 2);
        image.put_pixel(2, 1, Rgba([1, 2, 3, 4]));

        let raster = OutputRaster::from_image(&DynamicImage::ImageRgba8(image.clone()), transform(),
                                              CoordinateSystem::WebMercator).unwrap();
        assert_eq!(raster.band_count(), 4);
        assert_eq!((raster.width(), raster.height()), (3, 2));
        assert_eq!(raster.bands[3][[1, 2]], 4);

        assert_eq!(raster.to_image().unwrap(), DynamicImage::ImageRgba8(image));
    }

    #[test]
    fn test_window_is_zero_padded() {
        let bands = vec![Array2::from_elem((2, 2), 9u8); 3];
        let raster = OutputRaster::new(bands, transform(), CoordinateSystem::WebMercator).unwrap();

        let window = raster.interleave_window(1, 1, 2, 2);
        assert_eq!(window.len(), 12);
        assert_eq!(&window[..3], &[9, 9, 9]);
        assert!(window[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_decimate_halves_and_scales() {
        let bands = vec![Array2::from_shape_fn((5, 4), |(r, c)| (r * 10 + c) as u8); 3];
        let raster = OutputRaster::new(bands, transform(), CoordinateSystem::WebMercator).unwrap();

        let half = raster.decimate();
        assert_eq!((half.width(), half.height()), (2, 3));
        assert_eq!(half.bands[0][[2, 1]], 42);
        assert_eq!(half.transform.pixel_width, 2.0);
        assert_eq!(half.transform.pixel_height, -2.0);
    }

    #[test]
    fn test_mismatched_bands_rejected() {
        let bands = vec![Array2::zeros((2, 2)), Array2::zeros((2, 3)), Array2::zeros((2, 2))];
        assert!(OutputRaster::new(bands, transform(), CoordinateSystem::WebMercator).is_err());
    }
}
