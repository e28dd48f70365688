use std::path::{Path, PathBuf};

use log::info;

use crate::cog::{CogConverter, CogProfile};
use crate::config::MosaicConfig;
use crate::coordinate::CoordinateSystemFactory;
use crate::errors::MosaicResult;
use crate::mosaic::{MosaicOutcome, MosaicRequest, Mosaicker};
use crate::raster::GeoTiffWriter;
use crate::reproject::{self, ReprojectOptions, Resampling};
use crate::tiles::list_providers;

/// Main interface to the tilemosaic library
pub struct TileMosaic {
    mosaicker: Mosaicker,
}

impl TileMosaic {
    /// Create an instance fetching tiles over HTTP
    ///
    /// # Arguments
    /// * `config` - Fetch, output and post-processing settings
    pub fn new(config: MosaicConfig) -> MosaicResult<Self> {
        Ok(TileMosaic { mosaicker: Mosaicker::new(config)? })
    }

    /// Create an instance from a TOML configuration file
    pub fn from_config_file(path: &Path) -> MosaicResult<Self> {
        Self::new(MosaicConfig::load(path)?)
    }

    /// Wrap an already assembled pipeline, e.g. one with a custom client
    pub fn from_mosaicker(mosaicker: Mosaicker) -> Self {
        TileMosaic { mosaicker }
    }

    /// Download, mosaic and georeference the tiles covering a bounding box
    ///
    /// # Arguments
    /// * `request` - Output path, bbox, zoom or resolution, source and options
    ///
    /// # Returns
    /// Where the raster went, the image itself, or that the output already existed
    pub fn tms_to_geotiff(&self, request: &MosaicRequest) -> MosaicResult<MosaicOutcome> {
        self.mosaicker.build(request)
    }

    /// Reproject a GeoTIFF, optionally converting the result to a COG
    ///
    /// # Arguments
    /// * `input` - Source GeoTIFF
    /// * `output` - Destination, may equal `input`
    /// * `dst_crs` - Target CRS such as `"EPSG:4326"`
    /// * `resampling` - `"nearest"` or `"bilinear"`
    /// * `to_cog` - Rewrite the result as a COG in place
    pub fn reproject(&self, input: &Path, output: &Path, dst_crs: &str, resampling: &str, to_cog: bool)
                     -> MosaicResult<()> {
        let config = self.mosaicker.config();
        let options = ReprojectOptions {
            dst_crs: CoordinateSystemFactory::from_string(dst_crs)?,
            resampling: Resampling::from_name(resampling)?,
            proj_data_dir: config.projection.data_dir.clone(),
        };

        let writer = GeoTiffWriter::new(config.geotiff_options());
        reproject::reproject_file(input, output, &options, &writer)?;

        if to_cog {
            let profile = CogProfile::from_name(&config.cog.profile)?;
            CogConverter::new(profile, config.cog.block_size).convert(output, output)?;
        }
        info!("Reprojected {} to {}", input.display(), dst_crs);
        Ok(())
    }

    /// Convert a GeoTIFF to a Cloud-Optimized GeoTIFF with the configured block size
    ///
    /// # Returns
    /// The path written, `<stem>_cog.tif` beside the source by default
    pub fn image_to_cog(&self, source: &Path, destination: Option<&Path>, profile: &str) -> MosaicResult<PathBuf> {
        let block_size = self.mosaicker.config().cog.block_size;
        CogConverter::new(CogProfile::from_name(profile)?, block_size).convert_to(source, destination)
    }

    /// Names accepted as a tile source
    pub fn providers(&self) -> Vec<String> {
        list_providers(self.mosaicker.catalog(), self.mosaicker.config().catalog.free_only)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::{CoordinateSystem, GeoTransform};
    use crate::raster::{OutputRaster, RasterWriter};
    use crate::tiff::constants::tags;
    use crate::tiff::TiffReader;
    use ndarray::Array2;

    #[test]
    fn test_image_to_cog_uses_configured_block_size() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("area.tif");
        let bands = (0..3).map(|b| Array2::from_elem((600, 600), b as u8)).collect();
        let raster = OutputRaster::new(bands, GeoTransform::north_up(0.0, 0.0, 1.0, 1.0),
                                       CoordinateSystem::WebMercator).unwrap();
        GeoTiffWriter::default().write(&raster, &source).unwrap();

        let mut config = MosaicConfig::default();
        config.cog.block_size = 256;
        let api = TileMosaic::new(config).unwrap();

        let written = api.image_to_cog(&source, None, "raw").unwrap();
        assert_eq!(written, dir.path().join("area_cog.tif"));

        let mut reader = TiffReader::open(&written).unwrap();
        let tiff = reader.read().unwrap();
        assert_eq!(tiff.ifds[0].get_tag_value(tags::TILE_WIDTH), Some(256));
    }
}
