//! Cloud-Optimized GeoTIFF output

pub mod profile;
pub mod converter;

pub use self::converter::{default_destination, image_to_cog, CogConverter, DEFAULT_BLOCK_SIZE};
pub use self::profile::CogProfile;
