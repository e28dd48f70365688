//! TIFF file construction
//!
//! [`TiffBuilder`] collects IFDs, their out-of-line tag data and their
//! compressed chunks, then hands everything to the writer in one pass.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use log::{info, error};

use crate::coordinate::{CoordinateSystem, GeoTransform};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::IFD;

use crate::tiff::builders::basic_tags::BasicTagsBuilder;
use crate::tiff::builders::geo_tags::GeoTagsBuilder;
use crate::tiff::builders::writer::WriterBuilder;

/// Pixel structure of one IFD
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    pub width: u32,
    pub height: u32,
    pub samples: u16,
    pub has_alpha: bool,
    pub compression: u16,
    pub predictor: u16,
}

/// Builder for creating TIFF files
pub struct TiffBuilder {
    is_big_tiff: bool,
    pub ifds: Vec<IFD>,
    chunk_data: HashMap<usize, Vec<Vec<u8>>>,
    external_data: HashMap<(usize, u16), Vec<u8>>,
}

impl TiffBuilder {
    /// Create a new TIFF builder
    pub fn new(is_big_tiff: bool) -> Self {
        info!("Creating new TiffBuilder (is_big_tiff: {})", is_big_tiff);
        TiffBuilder {
            is_big_tiff,
            ifds: Vec::new(),
            chunk_data: HashMap::new(),
            external_data: HashMap::new(),
        }
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Add an empty IFD and return its index
    pub fn add_ifd(&mut self) -> usize {
        let ifd_index = self.ifds.len();
        self.ifds.push(IFD::new(ifd_index, 0));
        ifd_index
    }

    /// Set external data for a tag
    pub fn set_external_data(&mut self, ifd_index: usize, tag: u16, data: Vec<u8>) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        self.external_data.insert((ifd_index, tag), data);
        Ok(())
    }

    /// Add dimension, sample and compression tags
    pub fn add_raster_tags(&mut self, ifd_index: usize, layout: &RasterLayout) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        BasicTagsBuilder::add_raster_tags(
            &mut self.ifds[ifd_index],
            &mut self.external_data,
            ifd_index,
            layout,
            self.is_big_tiff,
        );
        Ok(())
    }

    /// Attach compressed tiles, row-major across the tile grid
    pub fn set_tiles(&mut self, ifd_index: usize, tile_size: (u32, u32), tiles: Vec<Vec<u8>>) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        if tiles.is_empty() {
            return Err(TiffError::GenericError(format!("IFD #{} has no tiles", ifd_index)));
        }

        BasicTagsBuilder::set_tiles(
            &mut self.ifds[ifd_index],
            &mut self.chunk_data,
            &mut self.external_data,
            ifd_index,
            tile_size,
            tiles,
            self.is_big_tiff,
        );
        Ok(())
    }

    /// Add pixel scale, tiepoint and GeoKey tags
    pub fn add_georeferencing(
        &mut self,
        ifd_index: usize,
        transform: &GeoTransform,
        crs: &CoordinateSystem,
    ) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        GeoTagsBuilder::add_georeferencing(
            &mut self.ifds[ifd_index],
            &mut self.external_data,
            ifd_index,
            transform,
            crs,
        )
    }

    /// Mark an IFD as a reduced resolution overview
    pub fn mark_overview(&mut self, ifd_index: usize) -> TiffResult<()> {
        self.check_index(ifd_index)?;
        BasicTagsBuilder::mark_overview(&mut self.ifds[ifd_index]);
        Ok(())
    }

    /// Serialize to any seekable sink
    pub fn write_to<W: Write + Seek>(&self, writer: &mut W) -> TiffResult<u64> {
        WriterBuilder::write(writer, self.is_big_tiff, &self.ifds, &self.chunk_data, &self.external_data)
    }

    /// Write the TIFF to a file
    pub fn write(&self, path: &Path) -> TiffResult<u64> {
        info!("Writing TIFF file to: {}", path.display());
        let mut writer = BufWriter::new(File::create(path)?);
        let written = self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(written)
    }

    fn check_index(&self, ifd_index: usize) -> TiffResult<()> {
        if ifd_index >= self.ifds.len() {
            error!("Invalid IFD index {}, only have {} IFDs", ifd_index, self.ifds.len());
            return Err(TiffError::GenericError(format!("Invalid IFD index {}", ifd_index)));
        }
        Ok(())
    }
}
