//! CLI command implementations
//!
//! One command per subcommand, created by [`TileMosaicCommandFactory`].

pub mod command_traits;
pub mod mosaic_command;
pub mod reproject_command;
pub mod cog_command;
pub mod providers_command;

pub use command_traits::{Command, CommandFactory};
pub use mosaic_command::MosaicCommand;
pub use reproject_command::ReprojectCommand;
pub use cog_command::CogCommand;
pub use providers_command::ProvidersCommand;

use clap::{Arg, ArgAction, ArgMatches, Command as ClapCommand};

use crate::config::MosaicConfig;
use crate::errors::{MosaicError, MosaicResult};

/// Maps the chosen subcommand to its command
#[derive(Debug, Default)]
pub struct TileMosaicCommandFactory;

impl TileMosaicCommandFactory {
    pub fn new() -> Self {
        TileMosaicCommandFactory
    }
}

impl<'a> CommandFactory<'a> for TileMosaicCommandFactory {
    fn create_command(&self, args: &ArgMatches, config: &'a MosaicConfig) -> MosaicResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("mosaic", sub)) => Ok(Box::new(MosaicCommand::new(sub, config)?)),
            Some(("reproject", sub)) => Ok(Box::new(ReprojectCommand::new(sub, config)?)),
            Some(("cog", sub)) => Ok(Box::new(CogCommand::new(sub, config)?)),
            Some(("providers", sub)) => Ok(Box::new(ProvidersCommand::new(sub, config)?)),
            Some((other, _)) => Err(MosaicError::InputValidation(format!("Unknown command '{}'", other))),
            None => Err(MosaicError::InputValidation("No command given, see --help".to_string())),
        }
    }
}

/// The `tilemosaic` command line
pub fn build_cli() -> ClapCommand {
    ClapCommand::new("tilemosaic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build georeferenced GeoTIFF mosaics from XYZ map tile services")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            ClapCommand::new("mosaic")
                .about("Download tiles over a bounding box and write a GeoTIFF")
                .arg(Arg::new("bbox").long("bbox").value_name("W,S,E,N").required(true)
                    .allow_hyphen_values(true)
                    .help("Bounding box in degrees"))
                .arg(Arg::new("zoom").short('z').long("zoom").value_name("LEVEL")
                    .conflicts_with("resolution")
                    .help("Tile zoom level"))
                .arg(Arg::new("resolution").short('r').long("resolution").value_name("METERS")
                    .help("Ground resolution in meters per pixel, instead of --zoom"))
                .arg(Arg::new("source").short('s').long("source").value_name("SOURCE")
                    .default_value("OPENSTREETMAP")
                    .help("Built-in provider, catalog name or URL template with {x}, {y}, {z}"))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE").required(true)
                    .help("Output GeoTIFF"))
                .arg(Arg::new("crs").long("crs").value_name("EPSG:XXXX")
                    .help("Output CRS, EPSG:3857 when omitted"))
                .arg(Arg::new("cog").long("cog").action(ArgAction::SetTrue)
                    .help("Convert the result to a Cloud-Optimized GeoTIFF"))
                .arg(Arg::new("overwrite").long("overwrite").action(ArgAction::SetTrue)
                    .help("Replace an existing output file"))
                .arg(Arg::new("quiet").short('q').long("quiet").action(ArgAction::SetTrue)
                    .help("Hide the download progress bar")),
        )
        .subcommand(
            ClapCommand::new("reproject")
                .about("Reproject a GeoTIFF to another CRS")
                .arg(Arg::new("input").required(true).index(1).help("Input GeoTIFF"))
                .arg(Arg::new("crs").long("crs").value_name("EPSG:XXXX").required(true)
                    .help("Target CRS"))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE")
                    .help("Output file, the input is replaced when omitted"))
                .arg(Arg::new("resampling").long("resampling").value_name("METHOD")
                    .value_parser(["nearest", "bilinear"])
                    .help("Resampling method")),
        )
        .subcommand(
            ClapCommand::new("cog")
                .about("Convert a GeoTIFF to a Cloud-Optimized GeoTIFF")
                .arg(Arg::new("input").required(true).index(1).help("Input GeoTIFF"))
                .arg(Arg::new("output").short('o').long("output").value_name("FILE")
                    .help("Output file, <stem>_cog.tif when omitted"))
                .arg(Arg::new("profile").short('p').long("profile").value_name("NAME")
                    .help("Compression profile: deflate, zstd or raw")),
        )
        .subcommand(
            ClapCommand::new("providers")
                .about("List available tile sources")
                .arg(Arg::new("all").long("all").action(ArgAction::SetTrue)
                    .help("Include providers that need an access token"))
                .arg(Arg::new("urls").long("urls").action(ArgAction::SetTrue)
                    .help("Show URL templates")),
        )
}
