//! TIFF file reader implementation
//!
//! Parses the header and IFD chain of classic TIFF and BigTIFF files in
//! either byte order, and reads tag value arrays and raw image chunks.

use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::io::byte_order::ByteOrder;
use crate::tiff::constants::{field_types, header};
use crate::tiff::errors::{TiffError, TiffResult};
use crate::tiff::ifd::{IFD, IFDEntry};
use crate::tiff::types::TIFF;

/// Upper bound on the IFD chain length, guards against offset loops
const MAX_IFDS: usize = 64;

/// Reader for TIFF and BigTIFF files
pub struct TiffReader<R: Read + Seek> {
    reader: R,
    byte_order: ByteOrder,
    is_big_tiff: bool,
    first_ifd_offset: u64,
    file_size: u64,
}

impl TiffReader<BufReader<File>> {
    /// Opens a TIFF file from disk and parses its header
    pub fn open(path: &Path) -> TiffResult<Self> {
        info!("Opening TIFF file: {}", path.display());
        let file = File::open(path)?;
        TiffReader::new(BufReader::with_capacity(1024 * 1024, file))
    }
}

impl<R: Read + Seek> TiffReader<R> {
    /// Wraps a reader and parses the TIFF header
    pub fn new(mut reader: R) -> TiffResult<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        let byte_order = ByteOrder::detect(&mut reader)?;
        let version = byte_order.read_u16(&mut reader)?;
        debug!("Byte order {}, version {}", byte_order.name(), version);

        let (is_big_tiff, first_ifd_offset) = match version {
            header::TIFF_VERSION => (false, byte_order.read_u32(&mut reader)? as u64),
            header::BIG_TIFF_VERSION => {
                let offset_size = byte_order.read_u16(&mut reader)?;
                let reserved = byte_order.read_u16(&mut reader)?;
                if offset_size != header::BIGTIFF_OFFSET_SIZE || reserved != 0 {
                    return Err(TiffError::InvalidBigTIFFHeader);
                }
                (true, byte_order.read_u64(&mut reader)?)
            }
            other => return Err(TiffError::UnsupportedVersion(other)),
        };

        if first_ifd_offset == 0 || first_ifd_offset >= file_size {
            return Err(TiffError::GenericError(format!(
                "First IFD offset {} outside file of {} bytes", first_ifd_offset, file_size)));
        }

        Ok(TiffReader {
            reader,
            byte_order,
            is_big_tiff,
            first_ifd_offset,
            file_size,
        })
    }

    /// Reads the complete IFD chain
    pub fn read(&mut self) -> TiffResult<TIFF> {
        let mut tiff = TIFF::new(self.is_big_tiff, self.byte_order);
        let mut offset = self.first_ifd_offset;

        while offset != 0 && tiff.ifds.len() < MAX_IFDS {
            if offset >= self.file_size {
                warn!("IFD offset {} exceeds file size {}, stopping IFD chain", offset, self.file_size);
                break;
            }

            let number = tiff.ifds.len();
            let (ifd, next) = self.read_ifd(offset, number)?;
            debug!("Read IFD #{} with {} entries, next at {}", number, ifd.entries.len(), next);
            tiff.ifds.push(ifd);
            offset = next;
        }

        info!("Read {} IFDs", tiff.ifds.len());
        Ok(tiff)
    }

    /// Reads one IFD and returns it with the offset of the next one
    fn read_ifd(&mut self, offset: u64, number: usize) -> TiffResult<(IFD, u64)> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let order = self.byte_order;

        let entry_count = if self.is_big_tiff {
            order.read_u64(&mut self.reader)?
        } else {
            order.read_u16(&mut self.reader)? as u64
        };

        let mut ifd = IFD::new(number, offset);
        for _ in 0..entry_count {
            let tag = order.read_u16(&mut self.reader)?;
            let field_type = order.read_u16(&mut self.reader)?;
            let (count, raw) = if self.is_big_tiff {
                (order.read_u64(&mut self.reader)?, order.read_u64(&mut self.reader)?)
            } else {
                (order.read_u32(&mut self.reader)? as u64, order.read_u32(&mut self.reader)? as u64)
            };

            let mut entry = IFDEntry::new(tag, field_type, count, raw);
            // Single inline values are normalized so get_tag_value works in both byte orders
            if count == 1 && entry.is_value_inline(self.is_big_tiff) {
                entry.value_offset = self.decode_inline_single(field_type, raw)?;
            }
            ifd.add_entry(entry);
        }

        let next = if self.is_big_tiff {
            order.read_u64(&mut self.reader)?
        } else {
            order.read_u32(&mut self.reader)? as u64
        };

        Ok((ifd, next))
    }

    fn decode_inline_single(&self, field_type: u16, raw: u64) -> TiffResult<u64> {
        if matches!(field_type, field_types::FLOAT | field_types::DOUBLE
            | field_types::RATIONAL | field_types::SRATIONAL) {
            return Ok(raw);
        }
        let bytes = self.byte_order.inline_bytes(raw, self.is_big_tiff);
        let mut values = Vec::with_capacity(1);
        Self::decode_values(self.byte_order, &mut Cursor::new(bytes), field_type, 1, &mut values)?;
        Ok(values.first().copied().unwrap_or(raw))
    }

    /// Reads a tag's values as unsigned integers
    pub fn read_tag_values(&mut self, ifd: &IFD, tag: u16) -> TiffResult<Vec<u64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;

        if entry.count == 1 && entry.is_value_inline(self.is_big_tiff) {
            return Ok(vec![entry.value_offset]);
        }

        let mut values = Vec::with_capacity(entry.count as usize);
        let bytes = self.read_entry_bytes(entry)?;
        Self::decode_values(self.byte_order, &mut Cursor::new(bytes), entry.field_type, entry.count, &mut values)?;
        Ok(values)
    }

    /// Reads a DOUBLE array tag such as ModelPixelScale or ModelTiepoint
    pub fn read_f64_values(&mut self, ifd: &IFD, tag: u16) -> TiffResult<Vec<f64>> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        if entry.field_type != field_types::DOUBLE {
            return Err(TiffError::UnsupportedFieldType(entry.field_type));
        }

        let bytes = self.read_entry_bytes(entry)?;
        let mut cursor = Cursor::new(bytes);
        (0..entry.count)
            .map(|_| self.byte_order.read_f64(&mut cursor).map_err(TiffError::from))
            .collect()
    }

    /// Reads an ASCII tag, trailing NULs removed
    pub fn read_ascii(&mut self, ifd: &IFD, tag: u16) -> TiffResult<String> {
        let entry = ifd.get_entry(tag).ok_or(TiffError::TagNotFound(tag))?;
        let mut bytes = self.read_entry_bytes(entry)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        String::from_utf8(bytes).map_err(|e| TiffError::GenericError(format!("Invalid UTF-8 string: {}", e)))
    }

    /// Reads `length` raw bytes at `offset`, used for tile and strip data
    pub fn read_chunk(&mut self, offset: u64, length: u64) -> TiffResult<Vec<u8>> {
        if offset.saturating_add(length) > self.file_size {
            return Err(TiffError::GenericError(format!(
                "Chunk at {} (+{} bytes) extends past end of file", offset, length)));
        }

        self.reader.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; length as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Returns whether the current file is a BigTIFF
    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    /// Returns the declared byte order
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn read_entry_bytes(&mut self, entry: &IFDEntry) -> TiffResult<Vec<u8>> {
        let len = entry.byte_len();
        if entry.is_value_inline(self.is_big_tiff) {
            let mut bytes = self.byte_order.inline_bytes(entry.value_offset, self.is_big_tiff);
            bytes.truncate(len as usize);
            return Ok(bytes);
        }
        self.read_chunk(entry.value_offset, len)
    }

    fn decode_values(
        order: ByteOrder,
        reader: &mut impl Read,
        field_type: u16,
        count: u64,
        values: &mut Vec<u64>,
    ) -> TiffResult<()> {
        for _ in 0..count {
            let value = match field_type {
                field_types::BYTE | field_types::SBYTE | field_types::UNDEFINED | field_types::ASCII => {
                    let mut b = [0u8; 1];
                    reader.read_exact(&mut b)?;
                    b[0] as u64
                }
                field_types::SHORT | field_types::SSHORT => order.read_u16(reader)? as u64,
                field_types::LONG | field_types::SLONG => order.read_u32(reader)? as u64,
                field_types::LONG8 | field_types::SLONG8 | field_types::IFD8 => order.read_u64(reader)?,
                _ => return Err(TiffError::UnsupportedFieldType(field_type)),
            };
            values.push(value);
        }
        Ok(())
    }
}
