//! I/O utilities for file handling
//!
//! Byte order aware primitives used by the TIFF reader.

pub mod byte_order;
