pub mod errors;
pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod coordinate;
pub mod raster;
pub mod tiles;
pub mod mosaic;
pub mod reproject;
pub mod cog;
pub mod config;
pub mod components;
pub mod commands;
pub mod api;

pub use crate::api::TileMosaic;
pub use crate::errors::{MosaicError, MosaicResult, NetworkError};

pub use config::MosaicConfig;
pub use coordinate::{BoundingBox, CoordinateSystem, GeoTransform};
pub use mosaic::{build_mosaic, MosaicOutcome, MosaicRequest, Mosaicker, PipelineStage};
pub use tiles::{list_providers, TileSource};
pub use cog::image_to_cog;
