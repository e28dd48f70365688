//! Reproject an existing GeoTIFF

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::mosaic_command::required;
use crate::config::MosaicConfig;
use crate::coordinate::CoordinateSystemFactory;
use crate::errors::MosaicResult;
use crate::raster::GeoTiffWriter;
use crate::reproject::{self, ReprojectOptions, Resampling};

/// Command warping a raster into another CRS
pub struct ReprojectCommand<'a> {
    input: PathBuf,
    output: PathBuf,
    options: ReprojectOptions,
    config: &'a MosaicConfig,
}

impl<'a> ReprojectCommand<'a> {
    /// Without `--output` the input is replaced
    pub fn new(args: &ArgMatches, config: &'a MosaicConfig) -> MosaicResult<Self> {
        let input = PathBuf::from(required(args, "input")?);
        let output = args.get_one::<String>("output").map(PathBuf::from).unwrap_or_else(|| input.clone());

        let options = ReprojectOptions {
            dst_crs: CoordinateSystemFactory::from_string(required(args, "crs")?)?,
            resampling: match args.get_one::<String>("resampling") {
                Some(name) => Resampling::from_name(name)?,
                None => Resampling::default(),
            },
            proj_data_dir: config.projection.data_dir.clone(),
        };

        Ok(ReprojectCommand { input, output, options, config })
    }
}

impl<'a> Command for ReprojectCommand<'a> {
    fn execute(&self) -> MosaicResult<()> {
        info!("Reprojecting {} with {} resampling", self.input.display(), self.options.resampling);
        let writer = GeoTiffWriter::new(self.config.geotiff_options());
        let raster = reproject::reproject_file(&self.input, &self.output, &self.options, &writer)?;
        println!("Wrote {} ({}x{}, {})", self.output.display(), raster.width(), raster.height(),
                 raster.crs.authority_string());
        Ok(())
    }
}
