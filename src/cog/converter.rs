//! Rewriting GeoTIFFs as Cloud-Optimized GeoTIFFs
//!
//! The output keeps every IFD ahead of the pixel data and stores the
//! smallest overview first, so a reader can fetch the header and any
//! pyramid level with a couple of range requests.

use std::path::{Path, PathBuf};

use log::info;

use crate::cog::profile::CogProfile;
use crate::errors::{MosaicError, MosaicResult};
use crate::raster::{GeoTiffReader, GeoTiffWriter, RasterWriter};

/// Internal tile edge of COG output
pub const DEFAULT_BLOCK_SIZE: u32 = 512;

/// `<stem>_cog.tif` next to `source`
pub fn default_destination(source: &Path) -> PathBuf {
    let stem = source.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    source.with_file_name(format!("{}_cog.tif", stem))
}

/// Converts GeoTIFFs with a fixed profile and block size
#[derive(Debug, Clone, Copy)]
pub struct CogConverter {
    profile: CogProfile,
    block_size: u32,
}

impl Default for CogConverter {
    fn default() -> Self {
        CogConverter::new(CogProfile::default(), DEFAULT_BLOCK_SIZE)
    }
}

impl CogConverter {
    pub fn new(profile: CogProfile, block_size: u32) -> Self {
        CogConverter { profile, block_size }
    }

    pub fn profile(&self) -> CogProfile {
        self.profile
    }

    /// Convert `source` into `destination`, which may be `source` itself
    pub fn convert(&self, source: &Path, destination: &Path) -> MosaicResult<()> {
        if !source.exists() {
            return Err(MosaicError::SourceNotFound(source.to_path_buf()));
        }

        let raster = GeoTiffReader::read(source)?;
        let writer = GeoTiffWriter::new(self.profile.geotiff_options(self.block_size));
        writer.write(&raster, destination)?;

        info!("Converted {} to COG {} ({} profile, {}px blocks)",
              source.display(), destination.display(), self.profile, self.block_size);
        Ok(())
    }

    /// Convert into `destination`, or `<stem>_cog.tif` beside the source
    pub fn convert_to(&self, source: &Path, destination: Option<&Path>) -> MosaicResult<PathBuf> {
        let destination = destination.map(Path::to_path_buf).unwrap_or_else(|| default_destination(source));
        self.convert(source, &destination)?;
        Ok(destination)
    }
}

/// Convert `source` to a COG and return where it was written
///
/// Without a destination the COG lands next to the source as `<stem>_cog.tif`.
pub fn image_to_cog(source: &Path, destination: Option<&Path>, profile: &str) -> MosaicResult<PathBuf> {
    CogConverter::new(CogProfile::from_name(profile)?, DEFAULT_BLOCK_SIZE).convert_to(source, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{CoordinateSystem, GeoTransform};
    use crate::raster::OutputRaster;
    use crate::tiff::constants::{compression, tags};
    use crate::tiff::TiffReader;
    use ndarray::Array2;

    fn write_source(path: &Path, size: usize) {
        let bands = (0..3).map(|b| Array2::from_shape_fn((size, size), |(r, c)| ((r + c + b) % 251) as u8)).collect();
        let raster = OutputRaster::new(bands, GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
                                       CoordinateSystem::WebMercator).unwrap();
        GeoTiffWriter::default().write(&raster, path).unwrap();
    }

    #[test]
    fn test_default_destination() {
        assert_eq!(default_destination(Path::new("/data/area.tif")), PathBuf::from("/data/area_cog.tif"));
    }

    #[test]
    fn test_cog_has_overviews_and_keeps_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("area.tif");
        write_source(&source, 1200);

        let written = image_to_cog(&source, None, "deflate").unwrap();
        assert_eq!(written, dir.path().join("area_cog.tif"));

        let mut reader = TiffReader::open(&written).unwrap();
        let tiff = reader.read().unwrap();
        // 1200 -> 600 -> 300
        assert_eq!(tiff.ifds.len(), 3);
        assert_eq!(tiff.ifds[0].get_tag_value(tags::TILE_WIDTH), Some(512));
        assert_eq!(tiff.ifds[0].get_tag_value(tags::COMPRESSION), Some(compression::DEFLATE as u64));

        let back = GeoTiffReader::read(&written).unwrap();
        assert_eq!(back.width(), 1200);
        assert_eq!(back.bands[2][[700, 900]], ((700 + 900 + 2) % 251) as u8);
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let err = image_to_cog(&dir.path().join("absent.tif"), None, "raw").unwrap_err();
        assert!(matches!(err, MosaicError::SourceNotFound(_)));
    }

    #[test]
    fn test_unknown_profile_rejected_before_io() {
        let err = image_to_cog(Path::new("absent.tif"), None, "bogus").unwrap_err();
        assert!(matches!(err, MosaicError::InputValidation(_)));
    }
}
