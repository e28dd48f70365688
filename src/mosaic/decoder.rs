//! Tile byte decoding

use image::DynamicImage;

use crate::errors::{MosaicError, MosaicResult};

/// Turns downloaded tile bytes into pixels
pub trait TileDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> MosaicResult<DynamicImage>;
}

/// Decoder backed by the `image` crate's format detection
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTileDecoder;

impl TileDecoder for ImageTileDecoder {
    fn decode(&self, bytes: &[u8]) -> MosaicResult<DynamicImage> {
        image::load_from_memory(bytes)
            .map_err(|e| MosaicError::Decode(format!("{} ({} bytes)", e, bytes.len())))
    }
}
