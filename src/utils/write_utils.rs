//! TIFF writing utilities
//!
//! Alignment and entry ordering helpers for the TIFF writer.

use crate::tiff::errors::TiffResult;
use crate::tiff::ifd::IFDEntry;
use std::collections::BTreeMap;
use std::io::Write;

/// Round `offset` up to the next 4-byte boundary
pub fn align_to_4_bytes(offset: u64) -> u64 {
    (offset + 3) & !3
}

/// Write the zero bytes that bring a block of `data_len` bytes to a 4-byte boundary
pub fn write_padding(writer: &mut impl Write, data_len: usize) -> TiffResult<()> {
    let padding = (4 - (data_len % 4)) % 4;
    if padding > 0 {
        writer.write_all(&[0u8; 3][..padding])?;
    }
    Ok(())
}

/// Entries sorted by tag with duplicates removed, the last occurrence wins
pub fn get_unique_sorted_entries(entries: &[IFDEntry]) -> Vec<IFDEntry> {
    entries.iter()
        .map(|entry| (entry.tag, entry.clone()))
        .collect::<BTreeMap<u16, IFDEntry>>()
        .into_values()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment() {
        assert_eq!(align_to_4_bytes(0), 0);
        assert_eq!(align_to_4_bytes(5), 8);
        assert_eq!(align_to_4_bytes(8), 8);
    }

    #[test]
    fn test_padding_bytes() {
        let mut out = Vec::new();
        write_padding(&mut out, 5).unwrap();
        assert_eq!(out, vec![0, 0, 0]);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let entries = vec![
            IFDEntry::new(257, 4, 1, 10),
            IFDEntry::new(256, 4, 1, 20),
            IFDEntry::new(257, 4, 1, 30),
        ];
        let unique = get_unique_sorted_entries(&entries);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].tag, 256);
        assert_eq!(unique[1].value_offset, 30);
    }
}
