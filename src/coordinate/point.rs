//! Point structure for representing coordinates

/// A point in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate (longitude in geographic systems)
    pub x: f64,
    /// Y coordinate (latitude in geographic systems)
    pub y: f64,
}

impl Point {
    /// Create a new 2D point
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Create a geographic point from latitude and longitude in degrees
    pub fn from_lat_lon(lat: f64, lon: f64) -> Self {
        Point { x: lon, y: lat }
    }

    /// Latitude of a geographic point
    pub fn lat(&self) -> f64 {
        self.y
    }

    /// Longitude of a geographic point
    pub fn lon(&self) -> f64 {
        self.x
    }
}
