use chrono::NaiveDate;
use serde::Serialize;

use crate::coordinate::Point;

/// A sampled location to fetch imagery for
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointOfInterest {
    pub uid: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Free-form region label, e.g. an island name
    pub region: String,
    pub date: NaiveDate,
}

impl PointOfInterest {
    pub fn new(uid: u64, latitude: f64, longitude: f64, region: &str, date: NaiveDate) -> Self {
        PointOfInterest {
            uid,
            latitude,
            longitude,
            region: region.to_string(),
            date,
        }
    }

    pub fn location(&self) -> Point {
        Point::from_lat_lon(self.latitude, self.longitude)
    }
}
