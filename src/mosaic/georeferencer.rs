//! Attaching Web Mercator georeferencing to a cropped mosaic

use std::path::Path;

use image::DynamicImage;
use log::info;

use crate::coordinate::{BoundingBox, CoordinateSystem, GeoTransform};
use crate::errors::MosaicResult;
use crate::raster::{GeoTiffWriter, OutputRaster, RasterWriter};

/// Geotransform placing a `width x height` image over `bbox` in EPSG:3857
pub fn mercator_transform(bbox: &BoundingBox, width: u32, height: u32) -> MosaicResult<GeoTransform> {
    GeoTransform::from_bounds(bbox.to_web_mercator(), width, height)
}

/// Writes mosaics as georeferenced rasters
pub struct Georeferencer {
    writer: Box<dyn RasterWriter>,
}

impl Default for Georeferencer {
    fn default() -> Self {
        Georeferencer::new(Box::new(GeoTiffWriter::default()))
    }
}

impl Georeferencer {
    pub fn new(writer: Box<dyn RasterWriter>) -> Self {
        Georeferencer { writer }
    }

    /// Band-split `image` and place it over `bbox`
    pub fn georeference(image: &DynamicImage, bbox: &BoundingBox) -> MosaicResult<OutputRaster> {
        let transform = mercator_transform(bbox, image.width(), image.height())?;
        OutputRaster::from_image(image, transform, CoordinateSystem::WebMercator)
    }

    /// Georeference `image` and write it to `path`
    pub fn write(&self, image: &DynamicImage, bbox: &BoundingBox, path: &Path) -> MosaicResult<OutputRaster> {
        let raster = Self::georeference(image, bbox)?;
        info!("Georeferencing {} as {}", bbox, raster.transform);
        self.writer.write(&raster, path)?;
        Ok(raster)
    }
}
