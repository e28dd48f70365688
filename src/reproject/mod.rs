//! Reprojection of georeferenced rasters to another CRS
//!
//! The CRS math comes from proj4rs and is only compiled with the
//! `reproject` feature. Without it every entry point reports a
//! [`MosaicError::MissingOptionalComponent`].

pub mod resample;
#[cfg(feature = "reproject")]
pub mod crs;
#[cfg(feature = "reproject")]
pub mod warp;

use std::path::{Path, PathBuf};

use log::info;

use crate::coordinate::CoordinateSystem;
#[cfg(not(feature = "reproject"))]
use crate::errors::MosaicError;
use crate::errors::MosaicResult;
use crate::raster::{GeoTiffReader, OutputRaster, RasterWriter};

pub use self::resample::Resampling;

/// Whether this build can reproject
pub const AVAILABLE: bool = cfg!(feature = "reproject");

/// Target and method for a reprojection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReprojectOptions {
    pub dst_crs: CoordinateSystem,
    pub resampling: Resampling,
    /// Directory holding PROJ's `epsg` init file, for codes proj4rs lacks
    pub proj_data_dir: Option<PathBuf>,
}

impl ReprojectOptions {
    pub fn new(dst_crs: CoordinateSystem) -> Self {
        ReprojectOptions { dst_crs, ..Default::default() }
    }
}

/// Warp `raster` onto the default grid of `options.dst_crs`
#[cfg(feature = "reproject")]
pub fn reproject_raster(raster: &OutputRaster, options: &ReprojectOptions) -> MosaicResult<OutputRaster> {
    let transform = crs::CrsTransform::new(&raster.crs, &options.dst_crs, options.proj_data_dir.as_deref())?;
    let grid = warp::default_grid(&raster.transform, raster.width(), raster.height(), &transform)?;
    warp::warp(raster, &grid, options.dst_crs, &transform, options.resampling)
}

#[cfg(not(feature = "reproject"))]
pub fn reproject_raster(_raster: &OutputRaster, _options: &ReprojectOptions) -> MosaicResult<OutputRaster> {
    Err(MosaicError::MissingOptionalComponent(
        "reprojection (rebuild with the `reproject` feature)".to_string()))
}

/// Read `source`, reproject it and write the result to `destination`
///
/// `destination` may equal `source`; the write replaces it atomically.
pub fn reproject_file(source: &Path, destination: &Path, options: &ReprojectOptions,
                      writer: &dyn RasterWriter) -> MosaicResult<OutputRaster> {
    let raster = GeoTiffReader::read(source)?;
    let warped = if raster.crs == options.dst_crs {
        info!("{} is already in {}", source.display(), options.dst_crs.authority_string());
        raster
    } else {
        reproject_raster(&raster, options)?
    };

    writer.write(&warped, destination)?;
    info!("Reprojected {} to {} -> {}", source.display(), options.dst_crs.authority_string(),
          destination.display());
    Ok(warped)
}

#[cfg(all(test, feature = "reproject"))]
mod tests {
    use super::*;
    use crate::coordinate::{BoundingBox, GeoTransform};
    use crate::raster::GeoTiffWriter;
    use ndarray::Array2;

    #[test]
    fn test_reproject_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tile.tif");
        let bbox = BoundingBox::new(2.0, 48.0, 2.5, 48.5).unwrap();
        let transform = GeoTransform::from_bounds(bbox.to_web_mercator(), 50, 60).unwrap();
        let bands = (0..3).map(|b| Array2::from_elem((60, 50), 40 * (b + 1) as u8)).collect();
        let raster = OutputRaster::new(bands, transform, CoordinateSystem::WebMercator).unwrap();

        let writer = GeoTiffWriter::default();
        writer.write(&raster, &path).unwrap();

        let options = ReprojectOptions::new(CoordinateSystem::WGS84);
        reproject_file(&path, &path, &options, &writer).unwrap();

        let back = GeoTiffReader::read(&path).unwrap();
        assert_eq!(back.crs, CoordinateSystem::WGS84);
        let (west, _, _, north) = back.bounds();
        assert!((west - 2.0).abs() < 1e-3);
        assert!((north - 48.5).abs() < 1e-3);
        let (rows, cols) = back.bands[1].dim();
        assert_eq!(back.bands[1][(rows / 2, cols / 2)], 80);
    }

    #[test]
    fn test_non_wgs84_geographic_target_gets_geographic_keys() {
        use crate::tiff::constants::{geo_keys, tags};
        use crate::tiff::{GeoKeyDirectory, TiffReader};

        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("mercator.tif");
        let target = dir.path().join("nad83.tif");
        let bbox = BoundingBox::new(-122.0, 37.0, -121.99, 37.01).unwrap();
        let transform = GeoTransform::from_bounds(bbox.to_web_mercator(), 40, 40).unwrap();
        let bands = (0..3).map(|_| Array2::from_elem((40, 40), 90u8)).collect();
        let raster = OutputRaster::new(bands, transform, CoordinateSystem::WebMercator).unwrap();

        let writer = GeoTiffWriter::default();
        writer.write(&raster, &source).unwrap();
        reproject_file(&source, &target, &ReprojectOptions::new(CoordinateSystem::Other(4269)), &writer).unwrap();

        let mut reader = TiffReader::open(&target).unwrap();
        let tiff = reader.read().unwrap();
        let shorts = reader.read_tag_values(&tiff.ifds[0], tags::GEO_KEY_DIRECTORY_TAG).unwrap();
        let keys = GeoKeyDirectory::from_shorts(&shorts).unwrap();
        let value = |id: u16| keys.iter().find(|k| k.key_id == id).map(|k| k.value);

        assert_eq!(value(geo_keys::GT_MODEL_TYPE), Some(geo_keys::MODEL_TYPE_GEOGRAPHIC));
        assert_eq!(value(geo_keys::GEOGRAPHIC_TYPE), Some(4269));
        assert_eq!(value(geo_keys::PROJECTED_CS_TYPE), None);

        let back = GeoTiffReader::read(&target).unwrap();
        assert_eq!(back.crs, CoordinateSystem::Other(4269));
        let (west, _, _, north) = back.bounds();
        assert!((west + 122.0).abs() < 1e-3);
        assert!((north - 37.01).abs() < 1e-3);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = reproject_file(&dir.path().join("none.tif"), &dir.path().join("out.tif"),
                                 &ReprojectOptions::default(), &GeoTiffWriter::default()).unwrap_err();
        assert!(matches!(err, crate::errors::MosaicError::SourceNotFound(_)));
    }
}
