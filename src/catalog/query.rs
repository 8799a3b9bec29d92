//! Search parameters for a catalog query

use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::coordinate::BoundingBox;

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// First day
    pub start: NaiveDate,
    /// Last day
    pub end: NaiveDate,
}

impl DateRange {
    /// The `days` days leading up to and including `date`
    pub fn ending_on(date: NaiveDate, days: i64) -> Self {
        DateRange {
            start: date - Duration::days(days),
            end: date,
        }
    }

    /// Interval with each bound expanded to a full RFC 3339 instant
    ///
    /// The start is the first second of the first day and the end the last
    /// second of the last day, both in UTC.
    pub fn to_rfc3339_interval(&self) -> String {
        format!("{}T00:00:00Z/{}T23:59:59Z",
                self.start.format("%Y-%m-%d"), self.end.format("%Y-%m-%d"))
    }
}

impl fmt::Display for DateRange {
    /// `YYYY-MM-DDT/YYYY-MM-DDT`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.format("%Y-%m-%dT"), self.end.format("%Y-%m-%dT"))
    }
}

/// One catalog search
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Collections to search
    pub collections: Vec<String>,
    /// Geographic search box (EPSG:4326)
    pub bbox: BoundingBox,
    /// Acquisition window
    pub datetime: DateRange,
    /// Page size requested from the server
    pub limit: u32,
}

/// JSON body of a `POST /search` request
#[derive(Debug, Serialize)]
pub struct SearchBody {
    pub collections: Vec<String>,
    pub bbox: [f64; 4],
    pub datetime: String,
    pub limit: u32,
}

impl SearchQuery {
    /// Request body for the first page
    pub fn to_body(&self) -> SearchBody {
        SearchBody {
            collections: self.collections.clone(),
            bbox: self.bbox.to_array(),
            datetime: self.datetime.to_rfc3339_interval(),
            limit: self.limit,
        }
    }
}
