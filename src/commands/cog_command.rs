//! Convert a GeoTIFF to a Cloud-Optimized GeoTIFF

use std::path::PathBuf;

use clap::ArgMatches;

use crate::cog::{default_destination, CogConverter};
use crate::commands::command_traits::Command;
use crate::commands::mosaic_command::required;
use crate::components::Components;
use crate::config::MosaicConfig;
use crate::errors::MosaicResult;

/// Command rewriting a raster as a COG
pub struct CogCommand {
    input: PathBuf,
    output: PathBuf,
    converter: CogConverter,
}

impl CogCommand {
    pub fn new(args: &ArgMatches, config: &MosaicConfig) -> MosaicResult<Self> {
        let input = PathBuf::from(required(args, "input")?);
        let output = args.get_one::<String>("output")
            .map(PathBuf::from)
            .unwrap_or_else(|| default_destination(&input));

        let profile_name = args.get_one::<String>("profile").map(String::as_str).unwrap_or(&config.cog.profile);
        let profile = Components::detect().require_cog_profile(profile_name)?;

        Ok(CogCommand { input, output, converter: CogConverter::new(profile, config.cog.block_size) })
    }
}

impl Command for CogCommand {
    fn execute(&self) -> MosaicResult<()> {
        self.converter.convert(&self.input, &self.output)?;
        println!("COG written to {} ({} profile)", self.output.display(), self.converter.profile());
        Ok(())
    }
}
