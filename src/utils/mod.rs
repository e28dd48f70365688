//! Utility modules for common functionality
//!
//! Logging backend, progress display and low-level TIFF write helpers.

pub mod logger;
pub mod progress;
pub(crate) mod write_utils;

pub use self::logger::Logger;
pub use self::progress::ProgressTracker;
