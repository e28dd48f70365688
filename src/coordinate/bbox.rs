//! Geographic bounding box of a mosaic request

use std::fmt;

use super::transform::{CoordinateTransformer, Point};
use crate::errors::{MosaicError, MosaicResult};

/// A WGS 84 bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western longitude
    pub west: f64,
    /// Southern latitude
    pub south: f64,
    /// Eastern longitude
    pub east: f64,
    /// Northern latitude
    pub north: f64,
}

impl BoundingBox {
    /// Create a validated bounding box
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> MosaicResult<Self> {
        let bbox = BoundingBox { west, south, east, north };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Build from a `[west, south, east, north]` slice
    pub fn from_slice(values: &[f64]) -> MosaicResult<Self> {
        match values {
            [west, south, east, north] => Self::new(*west, *south, *east, *north),
            _ => Err(MosaicError::InputValidation(format!(
                "Bounding box needs exactly 4 values (west, south, east, north), got {}", values.len()))),
        }
    }

    /// Parse a bounding box from a string (format: "west,south,east,north")
    pub fn from_string(bbox_str: &str) -> MosaicResult<Self> {
        let values = bbox_str.split(',')
            .map(|part| part.trim().parse::<f64>()
                .map_err(|_| MosaicError::InputValidation(format!("Invalid bounding box value: '{}'", part.trim()))))
            .collect::<MosaicResult<Vec<f64>>>()?;
        Self::from_slice(&values)
    }

    fn validate(&self) -> MosaicResult<()> {
        let values = [self.west, self.south, self.east, self.north];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MosaicError::InputValidation(format!("Bounding box has non-finite values: {}", self)));
        }
        if self.west >= self.east || self.south >= self.north {
            return Err(MosaicError::InputValidation(format!(
                "Bounding box must satisfy west < east and south < north: {}", self)));
        }
        if self.west < -180.0 || self.east > 180.0 {
            return Err(MosaicError::InputValidation(format!("Longitudes outside [-180, 180]: {}", self)));
        }

        let limit = CoordinateTransformer::MAX_LATITUDE;
        if self.south < -limit || self.north > limit {
            return Err(MosaicError::InputValidation(format!(
                "Latitudes outside the Web Mercator range [-{limit}, {limit}]: {}", self)));
        }
        Ok(())
    }

    /// Get the width of the bounding box in degrees
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Get the height of the bounding box in degrees
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            self.west + self.width() / 2.0,
            self.south + self.height() / 2.0,
        )
    }

    /// Corners projected to Web Mercator: `(min_x, min_y, max_x, max_y)`
    pub fn to_web_mercator(&self) -> (f64, f64, f64, f64) {
        let lower_left = CoordinateTransformer::wgs84_to_web_mercator(self.west, self.south);
        let upper_right = CoordinateTransformer::wgs84_to_web_mercator(self.east, self.north);
        (lower_left.x, lower_left.y, upper_right.x, upper_right.y)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}, {}]", self.west, self.south, self.east, self.north)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_requires_four_values() {
        assert!(BoundingBox::from_slice(&[-122.0, 37.0, -121.99]).is_err());
        assert!(BoundingBox::from_slice(&[-122.0, 37.0, -121.99, 37.01, 1.0]).is_err());
        assert!(BoundingBox::from_slice(&[-122.0, 37.0, -121.99, 37.01]).is_ok());
    }

    #[test]
    fn test_rejects_inverted_and_non_finite() {
        assert!(BoundingBox::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 1.0, 1.0, 1.0).is_err());
        assert!(BoundingBox::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 89.0).is_err());
    }

    #[test]
    fn test_from_string() {
        let bbox = BoundingBox::from_string("-122.0, 37.0, -121.99, 37.01").unwrap();
        assert_eq!(bbox.west, -122.0);
        assert_eq!(bbox.north, 37.01);
        assert!(BoundingBox::from_string("a,b,c,d").is_err());
    }
}
