//! Compression handler trait definition

use crate::tiff::errors::TiffResult;

/// Strategy trait for the TIFF chunk codecs
pub trait CompressionHandler: Send + Sync {
    /// Decompress one tile or strip
    fn decompress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Compress one tile or strip
    fn compress(&self, data: &[u8]) -> TiffResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;

    /// Value of the TIFF Compression tag
    fn code(&self) -> u16;
}
