//! TIFF horizontal differencing predictor (Predictor = 2)
//!
//! Each sample of a row is replaced by its difference to the same sample
//! of the previous pixel. Applied per row of a tile before compression.

/// Apply horizontal differencing in place.
///
/// `row_len` is the number of bytes in one row and `samples` the number of
/// interleaved 8-bit samples per pixel.
pub fn encode_horizontal(data: &mut [u8], row_len: usize, samples: usize) {
    if row_len == 0 || samples == 0 {
        return;
    }
    for row in data.chunks_mut(row_len) {
        for i in (samples..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - samples]);
        }
    }
}

/// Undo horizontal differencing in place
pub fn decode_horizontal(data: &mut [u8], row_len: usize, samples: usize) {
    if row_len == 0 || samples == 0 {
        return;
    }
    for row in data.chunks_mut(row_len) {
        for i in samples..row.len() {
            row[i] = row[i].wrapping_add(row[i - samples]);
        }
    }
}
