//! Compression handling for TIFF chunks
//!
//! Codec strategies selected by the TIFF Compression tag, plus the
//! horizontal differencing predictor.

mod handler;
mod uncompressed;
mod deflate;
mod factory;
#[cfg(feature = "zstd")]
mod zstd;
pub mod predictor;

pub use handler::CompressionHandler;
pub use uncompressed::UncompressedHandler;
pub use deflate::AdobeDeflateHandler;
pub use factory::CompressionFactory;
#[cfg(feature = "zstd")]
pub use self::zstd::ZstdHandler;
