//! Tests for TIFF reading and writing

mod test_utils;
