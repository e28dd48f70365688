//! Coordinate handling for geospatial data
//!
//! Bounding boxes, coordinate reference systems, the spherical Mercator
//! projection and pixel-to-world affine transforms.

mod bbox;
mod transform;
mod crs;
mod geotransform;

// Re-export key types
pub use self::bbox::BoundingBox;
pub use self::transform::{CoordinateTransformer, Point};
pub use self::crs::{CoordinateSystem, CoordinateSystemFactory};
pub use self::geotransform::GeoTransform;
