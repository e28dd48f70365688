//! Baseline TIFF tag strategies
//!
//! Adds the tags describing image structure: dimensions, samples,
//! compression and the tile grid.

use std::collections::HashMap;

use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::constants::{tags, field_types, photometric, planar_config, predictor,
                             sample_format, extra_samples, new_subfile_type};
use crate::tiff::builder::RasterLayout;
use log::debug;

/// Adds structural TIFF tags to an IFD
pub struct BasicTagsBuilder;

impl BasicTagsBuilder {
    /// Add the tags every 8-bit chunky raster needs
    pub fn add_raster_tags(
        ifd: &mut IFD,
        external_data: &mut HashMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        layout: &RasterLayout,
        is_big_tiff: bool,
    ) {
        debug!("Adding raster tags for {}x{} image, {} samples", layout.width, layout.height, layout.samples);

        ifd.set_entry(IFDEntry::new(tags::IMAGE_WIDTH, field_types::LONG, 1, layout.width as u64));
        ifd.set_entry(IFDEntry::new(tags::IMAGE_LENGTH, field_types::LONG, 1, layout.height as u64));

        let samples = layout.samples as usize;
        Self::add_short_array(ifd, external_data, ifd_index, tags::BITS_PER_SAMPLE,
                              &vec![8; samples], is_big_tiff);

        ifd.set_entry(IFDEntry::new(tags::COMPRESSION, field_types::SHORT, 1, layout.compression as u64));

        let interpretation = if layout.samples >= 3 { photometric::RGB } else { photometric::BLACK_IS_ZERO };
        ifd.set_entry(IFDEntry::new(tags::PHOTOMETRIC_INTERPRETATION, field_types::SHORT, 1, interpretation as u64));
        ifd.set_entry(IFDEntry::new(tags::SAMPLES_PER_PIXEL, field_types::SHORT, 1, layout.samples as u64));
        ifd.set_entry(IFDEntry::new(tags::PLANAR_CONFIGURATION, field_types::SHORT, 1,
                                    planar_config::CHUNKY as u64));

        if layout.predictor != predictor::NONE {
            ifd.set_entry(IFDEntry::new(tags::PREDICTOR, field_types::SHORT, 1, layout.predictor as u64));
        }

        if layout.has_alpha {
            ifd.set_entry(IFDEntry::new(tags::EXTRA_SAMPLES, field_types::SHORT, 1,
                                        extra_samples::UNASSOCIATED_ALPHA as u64));
        }

        Self::add_short_array(ifd, external_data, ifd_index, tags::SAMPLE_FORMAT,
                              &vec![sample_format::UNSIGNED; samples], is_big_tiff);
    }

    /// Describe a tile grid and register its chunk data
    ///
    /// Offsets are placeholders until the writer has placed the chunks.
    /// A single byte count is stored inline, several go out of line.
    pub fn set_tiles(
        ifd: &mut IFD,
        chunk_data: &mut HashMap<usize, Vec<Vec<u8>>>,
        external_data: &mut HashMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        tile_size: (u32, u32),
        tiles: Vec<Vec<u8>>,
        is_big_tiff: bool,
    ) {
        let count = tiles.len() as u64;
        debug!("IFD #{}: {} tiles of {}x{}", ifd_index, count, tile_size.0, tile_size.1);

        let offset_type = if is_big_tiff { field_types::LONG8 } else { field_types::LONG };

        ifd.set_entry(IFDEntry::new(tags::TILE_WIDTH, field_types::LONG, 1, tile_size.0 as u64));
        ifd.set_entry(IFDEntry::new(tags::TILE_LENGTH, field_types::LONG, 1, tile_size.1 as u64));
        ifd.set_entry(IFDEntry::new(tags::TILE_OFFSETS, offset_type, count, 0));

        if count == 1 {
            ifd.set_entry(IFDEntry::new(tags::TILE_BYTE_COUNTS, offset_type, 1, tiles[0].len() as u64));
        } else {
            let mut data = Vec::with_capacity(tiles.len() * if is_big_tiff { 8 } else { 4 });
            for tile in &tiles {
                match is_big_tiff {
                    true => data.extend_from_slice(&(tile.len() as u64).to_le_bytes()),
                    false => data.extend_from_slice(&(tile.len() as u32).to_le_bytes()),
                }
            }
            ifd.set_entry(IFDEntry::new(tags::TILE_BYTE_COUNTS, offset_type, count, 0));
            external_data.insert((ifd_index, tags::TILE_BYTE_COUNTS), data);
        }

        chunk_data.insert(ifd_index, tiles);
    }

    /// Flag an IFD as a reduced resolution copy of the main image
    pub fn mark_overview(ifd: &mut IFD) {
        ifd.set_entry(IFDEntry::new(tags::NEW_SUBFILE_TYPE, field_types::LONG, 1,
                                    new_subfile_type::REDUCED_RESOLUTION as u64));
    }

    /// Store a SHORT array inline when it fits in the value field
    fn add_short_array(
        ifd: &mut IFD,
        external_data: &mut HashMap<(usize, u16), Vec<u8>>,
        ifd_index: usize,
        tag: u16,
        values: &[u16],
        is_big_tiff: bool,
    ) {
        let inline_capacity = if is_big_tiff { 4 } else { 2 };

        if values.len() <= inline_capacity {
            // Packed little-endian so the writer emits them in order
            let packed = values.iter().enumerate()
                .fold(0u64, |acc, (i, &v)| acc | ((v as u64) << (16 * i)));
            ifd.set_entry(IFDEntry::new(tag, field_types::SHORT, values.len() as u64, packed));
        } else {
            let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
            ifd.set_entry(IFDEntry::new(tag, field_types::SHORT, values.len() as u64, 0));
            external_data.insert((ifd_index, tag), data);
        }
    }
}
