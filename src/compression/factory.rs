//! Factory for creating compression handlers

use crate::tiff::constants::compression;
use crate::tiff::errors::{TiffError, TiffResult};
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
#[cfg(feature = "zstd")]
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a handler for a TIFF Compression tag value
    pub fn create_handler(code: u64) -> TiffResult<Box<dyn CompressionHandler>> {
        Self::with_level(code, None)
    }

    /// Create a handler with an explicit encoder level where the codec has one
    pub fn with_level(code: u64, level: Option<i32>) -> TiffResult<Box<dyn CompressionHandler>> {
        match u16::try_from(code) {
            Ok(compression::NONE) => Ok(Box::new(UncompressedHandler)),
            Ok(compression::DEFLATE) => Ok(Box::new(match level {
                Some(level) => AdobeDeflateHandler::with_level(level.max(0) as u32),
                None => AdobeDeflateHandler::new(),
            })),
            #[cfg(feature = "zstd")]
            Ok(compression::ZSTD) => Ok(Box::new(match level {
                Some(level) => ZstdHandler::with_level(level),
                None => ZstdHandler::new(),
            })),
            _ => Err(TiffError::UnsupportedCompression(code)),
        }
    }

    /// Whether this build can encode and decode `code`
    pub fn is_supported(code: u64) -> bool {
        Self::create_handler(code).is_ok()
    }
}
