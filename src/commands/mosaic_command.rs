//! Download tiles over a bounding box and write a GeoTIFF

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::config::MosaicConfig;
use crate::errors::{MosaicError, MosaicResult};
use crate::mosaic::{MosaicOutcome, MosaicRequest, Mosaicker};

/// Command building one mosaic
pub struct MosaicCommand<'a> {
    request: MosaicRequest,
    config: &'a MosaicConfig,
}

impl<'a> MosaicCommand<'a> {
    /// Parse `mosaic` subcommand arguments
    ///
    /// The bbox keeps however many numbers were given; the pipeline
    /// rejects anything other than four.
    pub fn new(args: &ArgMatches, config: &'a MosaicConfig) -> MosaicResult<Self> {
        let bbox_str = required(args, "bbox")?;
        let bbox = bbox_str.split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| MosaicError::InputValidation(
                format!("Invalid bounding box value '{}'", part.trim()))))
            .collect::<MosaicResult<Vec<f64>>>()?;

        let mut request = MosaicRequest::new(required(args, "output")?, bbox, required(args, "source")?)
            .to_cog(args.get_flag("cog"))
            .overwrite(args.get_flag("overwrite"))
            .quiet(args.get_flag("quiet"));

        if let Some(zoom) = args.get_one::<String>("zoom") {
            request = request.zoom(zoom.parse::<u8>().map_err(|_| MosaicError::InputValidation(
                format!("Invalid zoom level '{}'", zoom)))?);
        }
        if let Some(resolution) = args.get_one::<String>("resolution") {
            request = request.resolution(resolution.parse::<f64>().map_err(|_| MosaicError::InputValidation(
                format!("Invalid resolution '{}'", resolution)))?);
        }
        if let Some(crs) = args.get_one::<String>("crs") {
            request = request.dst_crs(crs);
        }

        Ok(MosaicCommand { request, config })
    }

    pub fn request(&self) -> &MosaicRequest {
        &self.request
    }
}

impl<'a> Command for MosaicCommand<'a> {
    fn execute(&self) -> MosaicResult<()> {
        info!("Building mosaic {} from {}", self.request.output.display(), self.request.source);
        let mosaicker = Mosaicker::new(self.config.clone())?;

        match mosaicker.build(&self.request)? {
            MosaicOutcome::Written(path) => println!("Image saved to {}", path.display()),
            MosaicOutcome::Skipped(path) => println!(
                "{} already exists. Use --overwrite to replace it.", path.display()),
            MosaicOutcome::Image(image) => println!("Built {}x{} image", image.width(), image.height()),
        }
        Ok(())
    }
}

pub(crate) fn required<'m>(args: &'m ArgMatches, name: &str) -> MosaicResult<&'m str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| MosaicError::InputValidation(format!("Missing --{}", name)))
}
