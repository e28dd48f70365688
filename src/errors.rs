//! Error types for the mosaic pipeline
//!
//! Every fallible operation outside the low-level TIFF codec returns a
//! [`MosaicResult`]. TIFF codec failures are wrapped rather than flattened
//! so callers can still match on the underlying [`TiffError`].

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::tiff::errors::TiffError;

/// Failures while talking to a tile server
#[derive(Debug)]
pub enum NetworkError {
    /// Every attempt failed at the transport level (connect, timeout, body read)
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
    /// The server answered with an error status other than 404
    HttpStatus { url: String, status: u16 },
    /// The HTTP client could not be constructed
    Client(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::RetriesExhausted { url, attempts, last_error } => write!(
                f,
                "giving up on {} after {} attempts: {}",
                url, attempts, last_error
            ),
            NetworkError::HttpStatus { url, status } => {
                write!(f, "HTTP {} from {}", status, url)
            }
            NetworkError::Client(msg) => write!(f, "failed to create HTTP client: {}", msg),
        }
    }
}

/// Errors raised while building, georeferencing or post-processing a mosaic
#[derive(Debug)]
pub enum MosaicError {
    /// Malformed bbox, conflicting zoom/resolution, unknown source, bad CRS string
    InputValidation(String),
    /// Unretryable or retry-exhausted tile download
    Network(NetworkError),
    /// The CRS subsystem could not be initialized or a transform failed
    Projection(String),
    /// A codec or reprojection backend is not compiled in
    MissingOptionalComponent(String),
    /// The raster to post-process does not exist
    SourceNotFound(PathBuf),
    /// A tile could not be decoded as an image
    Decode(String),
    /// Configuration file could not be parsed or holds invalid values
    Config(String),
    /// A fetch task was skipped because a sibling task already failed
    Aborted,
    /// A worker thread died before reporting its result
    Worker(String),
    /// TIFF encoding or decoding failure
    Tiff(TiffError),
    /// I/O error
    Io(io::Error),
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MosaicError::InputValidation(msg) => write!(f, "Invalid input: {}", msg),
            MosaicError::Network(e) => write!(f, "Network error: {}", e),
            MosaicError::Projection(msg) => write!(f, "Projection error: {}", msg),
            MosaicError::MissingOptionalComponent(what) => {
                write!(f, "Missing optional component: {}", what)
            }
            MosaicError::SourceNotFound(path) => {
                write!(f, "Source raster not found: {}", path.display())
            }
            MosaicError::Decode(msg) => write!(f, "Tile decode error: {}", msg),
            MosaicError::Config(msg) => write!(f, "Configuration error: {}", msg),
            MosaicError::Aborted => write!(f, "Operation aborted after an earlier failure"),
            MosaicError::Worker(msg) => write!(f, "Worker failure: {}", msg),
            MosaicError::Tiff(e) => write!(f, "{}", e),
            MosaicError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MosaicError::Tiff(e) => Some(e),
            MosaicError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MosaicError {
    fn from(error: io::Error) -> Self {
        MosaicError::Io(error)
    }
}

impl From<TiffError> for MosaicError {
    fn from(error: TiffError) -> Self {
        MosaicError::Tiff(error)
    }
}

impl From<NetworkError> for MosaicError {
    fn from(error: NetworkError) -> Self {
        MosaicError::Network(error)
    }
}

impl From<image::ImageError> for MosaicError {
    fn from(error: image::ImageError) -> Self {
        MosaicError::Decode(error.to_string())
    }
}

/// Result type for mosaic operations
pub type MosaicResult<T> = Result<T, MosaicError>;
