use std::path::Path;
use std::process;

use log::{error, info, LevelFilter};

use tilemosaic::commands::{build_cli, CommandFactory, TileMosaicCommandFactory};
use tilemosaic::components::Components;
use tilemosaic::config::MosaicConfig;
use tilemosaic::utils::logger::Logger;

fn main() {
    let matches = build_cli().get_matches();

    let config = match matches.get_one::<String>("config") {
        Some(path) => MosaicConfig::load(Path::new(path)),
        None => Ok(MosaicConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config.logging.level_filter()
    };
    if let Err(e) = Logger::init_global_logger(config.logging.file.as_deref(), level) {
        eprintln!("Error setting up logger: {}", e);
        process::exit(1);
    }
    info!("tilemosaic {} ({})", env!("CARGO_PKG_VERSION"), Components::detect());

    let factory = TileMosaicCommandFactory::new();
    match factory.create_command(&matches, &config) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
