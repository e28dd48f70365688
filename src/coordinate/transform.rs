//! Spherical Mercator conversions

use std::f64::consts::PI;

/// A point in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (longitude in geographic systems)
    pub x: f64,
    /// Y coordinate (latitude in geographic systems)
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

/// Converts between WGS 84 degrees and EPSG:3857 metres
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Sphere radius of EPSG:3857 in metres
    pub const EARTH_RADIUS: f64 = 6378137.0;

    /// Latitude at which the Web Mercator world becomes square
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

    /// WGS 84 longitude/latitude to Web Mercator metres
    pub fn wgs84_to_web_mercator(lon: f64, lat: f64) -> Point {
        let x = Self::EARTH_RADIUS * lon.to_radians();
        let y = Self::EARTH_RADIUS * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Point::new(x, y)
    }

    /// Web Mercator metres to WGS 84 longitude/latitude
    pub fn web_mercator_to_wgs84(x: f64, y: f64) -> Point {
        let lon = (x / Self::EARTH_RADIUS).to_degrees();
        let lat = (2.0 * (y / Self::EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees();
        Point::new(lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_origin_maps_to_origin() {
        let p = CoordinateTransformer::wgs84_to_web_mercator(0.0, 0.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_world_edge() {
        let p = CoordinateTransformer::wgs84_to_web_mercator(180.0, CoordinateTransformer::MAX_LATITUDE);
        assert_relative_eq!(p.x, 20037508.342789244, epsilon = 1e-6);
        assert_relative_eq!(p.y, 20037508.342789244, epsilon = 1e-3);
    }

    #[test]
    fn test_round_trip() {
        let p = CoordinateTransformer::wgs84_to_web_mercator(-122.0, 37.0);
        let back = CoordinateTransformer::web_mercator_to_wgs84(p.x, p.y);
        assert_relative_eq!(back.x, -122.0, epsilon = 1e-9);
        assert_relative_eq!(back.y, 37.0, epsilon = 1e-9);
    }
}
