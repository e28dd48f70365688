//! TIFF file layout and serialization
//!
//! Files are laid out IFDs first, then out-of-line tag data, then image
//! chunks. Chunks are written for the last IFD first so that, for a file
//! with overviews, the smallest overview comes first and the full
//! resolution data last. Everything is little-endian.

use crate::tiff::ifd::IFD;
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::constants::{header, tags};
use crate::utils::write_utils;
use log::{debug, info};
use std::collections::{BTreeMap, HashMap};
use std::io::{Seek, SeekFrom, Write};

/// Resolved positions of every piece of the file
struct Layout {
    ifd_offsets: Vec<u64>,
    tag_offsets: BTreeMap<(usize, u16), u64>,
    chunk_offsets: HashMap<usize, Vec<u64>>,
    total_size: u64,
}

/// Serializes IFDs, tag data and chunk data into a TIFF byte stream
pub struct WriterBuilder;

impl WriterBuilder {
    /// Write a complete TIFF file
    ///
    /// `chunk_data` holds, per IFD index, the compressed tiles (or strips)
    /// in the order their offsets must appear. Returns the number of bytes
    /// written.
    pub fn write<W: Write + Seek>(
        writer: &mut W,
        is_big_tiff: bool,
        ifds: &[IFD],
        chunk_data: &HashMap<usize, Vec<Vec<u8>>>,
        external_data: &HashMap<(usize, u16), Vec<u8>>,
    ) -> TiffResult<u64> {
        let sorted_ifds: Vec<IFD> = ifds.iter().map(|ifd| {
            let mut sorted = ifd.clone();
            sorted.entries = write_utils::get_unique_sorted_entries(&ifd.entries);
            sorted
        }).collect();

        let offset_arrays = Self::collect_offset_arrays(&sorted_ifds, chunk_data, is_big_tiff);
        let layout = Self::calculate_layout(&sorted_ifds, chunk_data, external_data, &offset_arrays, is_big_tiff);

        if !is_big_tiff && layout.total_size > header::CLASSIC_TIFF_LIMIT {
            return Err(TiffError::GenericError(format!(
                "{} bytes do not fit a classic TIFF, BigTIFF is required", layout.total_size)));
        }

        info!("Writing TIFF with {} IFDs, {} bytes", sorted_ifds.len(), layout.total_size);

        Self::write_header(writer, is_big_tiff, layout.ifd_offsets.first().copied().unwrap_or(0))?;

        for (index, ifd) in sorted_ifds.iter().enumerate() {
            let next = layout.ifd_offsets.get(index + 1).copied().unwrap_or(0);
            writer.seek(SeekFrom::Start(layout.ifd_offsets[index]))?;
            Self::write_ifd(writer, ifd, index, next, &layout, is_big_tiff)?;
        }

        for (key, offset) in &layout.tag_offsets {
            let data = match external_data.get(key) {
                Some(data) => data.clone(),
                None => Self::encode_offsets(&layout.chunk_offsets[&key.0], is_big_tiff),
            };
            writer.seek(SeekFrom::Start(*offset))?;
            writer.write_all(&data)?;
            write_utils::write_padding(writer, data.len())?;
        }

        for (ifd_index, chunks) in chunk_data {
            let offsets = &layout.chunk_offsets[ifd_index];
            for (chunk, offset) in chunks.iter().zip(offsets) {
                writer.seek(SeekFrom::Start(*offset))?;
                writer.write_all(chunk)?;
                write_utils::write_padding(writer, chunk.len())?;
            }
        }

        writer.seek(SeekFrom::Start(layout.total_size))?;
        writer.flush()?;
        Ok(layout.total_size)
    }

    /// Offset tags whose arrays cannot be stored inline, with their byte size
    fn collect_offset_arrays(
        ifds: &[IFD],
        chunk_data: &HashMap<usize, Vec<Vec<u8>>>,
        is_big_tiff: bool,
    ) -> BTreeMap<(usize, u16), u64> {
        let offset_size = if is_big_tiff { 8 } else { 4 };
        let mut arrays = BTreeMap::new();

        for (index, ifd) in ifds.iter().enumerate() {
            let chunk_count = chunk_data.get(&index).map(|c| c.len()).unwrap_or(0) as u64;
            if chunk_count <= 1 {
                continue;
            }
            if let Some(tag) = Self::offset_tag(ifd) {
                arrays.insert((index, tag), chunk_count * offset_size);
            }
        }

        arrays
    }

    fn offset_tag(ifd: &IFD) -> Option<u16> {
        [tags::TILE_OFFSETS, tags::STRIP_OFFSETS].into_iter().find(|&tag| ifd.has_tag(tag))
    }

    fn calculate_layout(
        ifds: &[IFD],
        chunk_data: &HashMap<usize, Vec<Vec<u8>>>,
        external_data: &HashMap<(usize, u16), Vec<u8>>,
        offset_arrays: &BTreeMap<(usize, u16), u64>,
        is_big_tiff: bool,
    ) -> Layout {
        let mut current = if is_big_tiff { 16 } else { 8 };

        let mut ifd_offsets = Vec::with_capacity(ifds.len());
        for ifd in ifds {
            ifd_offsets.push(current);
            current = write_utils::align_to_4_bytes(current + Self::calculate_ifd_size(ifd, is_big_tiff));
        }

        // Deterministic order keeps output byte-identical across runs
        let mut tag_sizes: BTreeMap<(usize, u16), u64> = external_data.iter()
            .map(|(key, data)| (*key, data.len() as u64))
            .collect();
        tag_sizes.extend(offset_arrays.iter().map(|(key, size)| (*key, *size)));

        let mut tag_offsets = BTreeMap::new();
        for (key, size) in tag_sizes {
            tag_offsets.insert(key, current);
            current = write_utils::align_to_4_bytes(current + size);
        }

        let mut chunk_offsets = HashMap::new();
        for index in (0..ifds.len()).rev() {
            let Some(chunks) = chunk_data.get(&index) else { continue };
            let mut offsets = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                offsets.push(current);
                current = write_utils::align_to_4_bytes(current + chunk.len() as u64);
            }
            debug!("IFD #{}: {} chunks placed", index, offsets.len());
            chunk_offsets.insert(index, offsets);
        }

        Layout {
            ifd_offsets,
            tag_offsets,
            chunk_offsets,
            total_size: current,
        }
    }

    /// Write the header: byte order marker, version and first IFD offset
    fn write_header(writer: &mut impl Write, is_big_tiff: bool, first_ifd_offset: u64) -> TiffResult<()> {
        writer.write_all(&header::LITTLE_ENDIAN_MARKER)?;

        if is_big_tiff {
            writer.write_all(&header::BIG_TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&header::BIGTIFF_OFFSET_SIZE.to_le_bytes())?;
            writer.write_all(&[0u8, 0])?;  // Reserved
            writer.write_all(&first_ifd_offset.to_le_bytes())?;
        } else {
            writer.write_all(&header::TIFF_VERSION.to_le_bytes())?;
            writer.write_all(&(first_ifd_offset as u32).to_le_bytes())?;
        }

        Ok(())
    }

    fn calculate_ifd_size(ifd: &IFD, is_big_tiff: bool) -> u64 {
        let entries_count = ifd.entries.len() as u64;

        match is_big_tiff {
            // 8-byte count, 20-byte entries, 8-byte next offset
            true => 8 + (20 * entries_count) + 8,
            // 2-byte count, 12-byte entries, 4-byte next offset
            false => 2 + (12 * entries_count) + 4,
        }
    }

    fn write_ifd(
        writer: &mut impl Write,
        ifd: &IFD,
        ifd_index: usize,
        next_offset: u64,
        layout: &Layout,
        is_big_tiff: bool,
    ) -> TiffResult<()> {
        match is_big_tiff {
            true => writer.write_all(&(ifd.entries.len() as u64).to_le_bytes())?,
            false => writer.write_all(&(ifd.entries.len() as u16).to_le_bytes())?,
        }

        let offset_tag = Self::offset_tag(ifd);

        for entry in &ifd.entries {
            let value_offset = if let Some(offset) = layout.tag_offsets.get(&(ifd_index, entry.tag)) {
                *offset
            } else if Some(entry.tag) == offset_tag {
                // A single chunk's offset is stored inline
                layout.chunk_offsets.get(&ifd_index)
                    .and_then(|offsets| offsets.first().copied())
                    .unwrap_or(0)
            } else {
                entry.value_offset
            };

            writer.write_all(&entry.tag.to_le_bytes())?;
            writer.write_all(&entry.field_type.to_le_bytes())?;

            match is_big_tiff {
                true => {
                    writer.write_all(&entry.count.to_le_bytes())?;
                    writer.write_all(&value_offset.to_le_bytes())?;
                }
                false => {
                    writer.write_all(&(entry.count as u32).to_le_bytes())?;
                    writer.write_all(&(value_offset as u32).to_le_bytes())?;
                }
            }
        }

        match is_big_tiff {
            true => writer.write_all(&next_offset.to_le_bytes())?,
            false => writer.write_all(&(next_offset as u32).to_le_bytes())?,
        }

        Ok(())
    }

    fn encode_offsets(offsets: &[u64], is_big_tiff: bool) -> Vec<u8> {
        let mut data = Vec::with_capacity(offsets.len() * if is_big_tiff { 8 } else { 4 });
        for &offset in offsets {
            match is_big_tiff {
                true => data.extend_from_slice(&offset.to_le_bytes()),
                false => data.extend_from_slice(&(offset as u32).to_le_bytes()),
            }
        }
        data
    }
}
