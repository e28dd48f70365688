//! In-memory georeferenced rasters and their GeoTIFF encoding

mod output;
mod geotiff_writer;
mod geotiff_reader;

pub use self::output::OutputRaster;
pub use self::geotiff_writer::{GeoTiffOptions, GeoTiffWriter, RasterWriter};
pub use self::geotiff_reader::GeoTiffReader;
