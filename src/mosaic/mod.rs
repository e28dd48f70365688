//! Turning downloaded tiles into a georeferenced raster

pub mod decoder;
pub mod compositor;
pub mod cropper;
pub mod georeferencer;
pub mod pipeline;

pub use self::compositor::{Mosaic, MosaicCompositor};
pub use self::cropper::{crop, CropWindow};
pub use self::decoder::{ImageTileDecoder, TileDecoder};
pub use self::georeferencer::{mercator_transform, Georeferencer};
pub use self::pipeline::{build_mosaic, MosaicOutcome, MosaicRequest, Mosaicker, PipelineStage};
