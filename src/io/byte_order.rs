//! Byte order handling for TIFF files
//!
//! TIFF files declare their endianness in the first two header bytes. The
//! reader decodes every multi-byte value through [`ByteOrder`].

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{Read, Result};

use crate::tiff::errors::{TiffError, TiffResult};

/// Represents the byte order of a TIFF file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian byte order (II)
    LittleEndian,
    /// Big-endian byte order (MM)
    BigEndian,
}

impl ByteOrder {
    /// Detects the byte order from the two marker bytes of a TIFF header
    pub fn detect(reader: &mut impl Read) -> TiffResult<Self> {
        let mut marker = [0u8; 2];
        reader.read_exact(&mut marker)?;
        match &marker {
            b"II" => Ok(ByteOrder::LittleEndian),
            b"MM" => Ok(ByteOrder::BigEndian),
            _ => Err(TiffError::InvalidByteOrder(u16::from_le_bytes(marker))),
        }
    }

    /// Returns a string representation of this byte order
    pub fn name(&self) -> &'static str {
        match self {
            ByteOrder::LittleEndian => "Little Endian (II)",
            ByteOrder::BigEndian => "Big Endian (MM)",
        }
    }

    pub fn read_u16(&self, reader: &mut impl Read) -> Result<u16> {
        match self {
            ByteOrder::LittleEndian => reader.read_u16::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u16::<BigEndian>(),
        }
    }

    pub fn read_u32(&self, reader: &mut impl Read) -> Result<u32> {
        match self {
            ByteOrder::LittleEndian => reader.read_u32::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u32::<BigEndian>(),
        }
    }

    pub fn read_u64(&self, reader: &mut impl Read) -> Result<u64> {
        match self {
            ByteOrder::LittleEndian => reader.read_u64::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_u64::<BigEndian>(),
        }
    }

    pub fn read_f64(&self, reader: &mut impl Read) -> Result<f64> {
        match self {
            ByteOrder::LittleEndian => reader.read_f64::<LittleEndian>(),
            ByteOrder::BigEndian => reader.read_f64::<BigEndian>(),
        }
    }

    /// Decodes a value stored inline in an IFD entry's value field.
    ///
    /// The reader hands inline fields over as the integer it read with this
    /// byte order; this recovers the raw bytes in file order.
    pub fn inline_bytes(&self, value_offset: u64, is_big_tiff: bool) -> Vec<u8> {
        match (self, is_big_tiff) {
            (ByteOrder::LittleEndian, true) => value_offset.to_le_bytes().to_vec(),
            (ByteOrder::BigEndian, true) => value_offset.to_be_bytes().to_vec(),
            (ByteOrder::LittleEndian, false) => (value_offset as u32).to_le_bytes().to_vec(),
            (ByteOrder::BigEndian, false) => (value_offset as u32).to_be_bytes().to_vec(),
        }
    }
}
