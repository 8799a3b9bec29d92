//! Bounding box structure for defining regions

use crate::errors::{ScoutError, ScoutResult};
use crate::extractor::Region;
use crate::tiff::geo_key_parser::GeoTransform;
use crate::tiff::constants::epsg;

use super::geodesic;
use super::point::Point;

/// A bounding box in a coordinate system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum X coordinate
    pub min_x: f64,
    /// Minimum Y coordinate
    pub min_y: f64,
    /// Maximum X coordinate
    pub max_x: f64,
    /// Maximum Y coordinate
    pub max_y: f64,
    /// EPSG code of the coordinate system
    pub epsg: Option<u32>,
}

impl BoundingBox {
    /// Create a new bounding box
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
            epsg: None,
        }
    }

    /// Create a new bounding box with coordinate system
    pub fn new_with_crs(min_x: f64, min_y: f64, max_x: f64, max_y: f64, epsg: u32) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
            epsg: Some(epsg),
        }
    }

    /// Geographic box reaching `buffer_meters` from a point in each direction
    ///
    /// The center is moved along the geodesic bearings 180, 270, 0 and 90
    /// degrees; the southern, western, northern and eastern destinations
    /// give min_lat, min_lon, max_lat and max_lon respectively.
    pub fn around(lat: f64, lon: f64, buffer_meters: f64) -> Self {
        let center = Point::from_lat_lon(lat, lon);

        let south = geodesic::destination(&center, 180.0, buffer_meters);
        let west = geodesic::destination(&center, 270.0, buffer_meters);
        let north = geodesic::destination(&center, 0.0, buffer_meters);
        let east = geodesic::destination(&center, 90.0, buffer_meters);

        BoundingBox::new_with_crs(west.lon(), south.lat(), east.lon(), north.lat(), epsg::WGS84)
    }

    /// Get the width of the bounding box
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Get the height of the bounding box
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Get the center point of the bounding box
    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width() / 2.0,
            self.min_y + self.height() / 2.0,
        )
    }

    /// Check if this bounding box strictly contains a point
    ///
    /// Points on the boundary are outside.
    pub fn contains(&self, point: &Point) -> bool {
        point.x > self.min_x && point.x < self.max_x &&
            point.y > self.min_y && point.y < self.max_y
    }

    /// `[min_x, min_y, max_x, max_y]`, the order used by STAC
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Convert to a pixel region given a geotransform
    ///
    /// Corner pixel coordinates are rounded outwards (floor for the start,
    /// ceil for the end) and the result is clamped to the raster. A box that
    /// does not overlap the raster is an error.
    pub fn to_pixel_region(&self, transform: &GeoTransform, width: u32, height: u32) -> ScoutResult<Region> {
        let corners = [
            (self.min_x, self.min_y),
            (self.min_x, self.max_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
        ];

        let mut col_min = f64::INFINITY;
        let mut col_max = f64::NEG_INFINITY;
        let mut row_min = f64::INFINITY;
        let mut row_max = f64::NEG_INFINITY;
        for (x, y) in corners {
            let (col, row) = transform.model_to_pixel(x, y)?;
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        let x0 = col_min.floor().clamp(0.0, width as f64) as u32;
        let x1 = col_max.ceil().clamp(0.0, width as f64) as u32;
        let y0 = row_min.floor().clamp(0.0, height as f64) as u32;
        let y1 = row_max.ceil().clamp(0.0, height as f64) as u32;

        if x1 <= x0 || y1 <= y0 {
            return Err(ScoutError::ProjectionError(format!(
                "Box [{}, {}, {}, {}] does not overlap the {}x{} raster",
                self.min_x, self.min_y, self.max_x, self.max_y, width, height)));
        }

        Ok(Region::new(x0, y0, x1 - x0, y1 - y0))
    }
}
