//! TIFF file format module
//!
//! Structures and functions for reading and writing TIFF and BigTIFF
//! files, including the GeoTIFF tag set.

pub mod errors;
pub mod ifd;
pub(crate) mod types;
pub mod reader;
#[cfg(test)]
mod tests;
pub mod geokeys;
pub mod builder;
mod builders;
pub(crate) mod constants;

pub use crate::io::byte_order::ByteOrder;
pub use errors::{TiffError, TiffResult};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use geokeys::{GeoKeyDirectory, GeoKeyEntry};
pub use builder::{RasterLayout, TiffBuilder};
