//! Coordinate transformation functionality
//!
//! Conversions between WGS 84 geographic coordinates, Web Mercator and the
//! UTM zones satellite imagery is delivered in.

use super::bbox::BoundingBox;
use super::crs::CoordinateSystem;
use super::geodesic::{WGS84_A, WGS84_F};
use super::point::Point;
use crate::errors::{ScoutError, ScoutResult};
use std::f64::consts::PI;

/// Points sampled along each edge when reprojecting a box
const EDGE_SAMPLES: usize = 21;

/// UTM scale factor on the central meridian
const UTM_K0: f64 = 0.9996;
const UTM_FALSE_EASTING: f64 = 500_000.0;
const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Transformer for converting between coordinate systems
pub struct CoordinateTransformer;

impl CoordinateTransformer {
    /// Earth radius in meters
    const EARTH_RADIUS: f64 = 6378137.0;

    /// Convert from WGS84 (EPSG:4326) to Web Mercator (EPSG:3857)
    pub fn wgs84_to_web_mercator(&self, lon: f64, lat: f64) -> Point {
        // Web Mercator is undefined at the poles
        let lat = lat.clamp(-85.05, 85.05);

        let x = lon * Self::EARTH_RADIUS * PI / 180.0;
        let y = f64::ln(f64::tan((90.0 + lat) * PI / 360.0)) * Self::EARTH_RADIUS;

        Point::new(x, y)
    }

    /// Convert from Web Mercator (EPSG:3857) to WGS84 (EPSG:4326)
    pub fn web_mercator_to_wgs84(&self, x: f64, y: f64) -> Point {
        let lon = x * 180.0 / (Self::EARTH_RADIUS * PI);
        let lat = 180.0 / PI * (2.0 * f64::atan(f64::exp(y / Self::EARTH_RADIUS)) - PI / 2.0);

        Point::new(lon, lat)
    }

    /// Convert WGS84 longitude/latitude to easting/northing in a UTM zone
    ///
    /// Transverse Mercator series expansion on the WGS-84 ellipsoid. Points
    /// south of the equator in a northern zone get negative northings.
    pub fn wgs84_to_utm(&self, lon: f64, lat: f64, zone: u8, is_northern: bool) -> Point {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi = lat.to_radians();
        let lambda0 = central_meridian(zone).to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = phi.tan();

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * (lon.to_radians() - lambda0);
        let m = meridian_arc(phi, e2);

        let easting = UTM_K0 * n * (a
            + (1.0 - t + c) * a.powi(3) / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + UTM_FALSE_EASTING;

        let mut northing = UTM_K0 * (m + n * tan_phi * (a * a / 2.0
            + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
            + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0));

        if !is_northern {
            northing += UTM_FALSE_NORTHING_SOUTH;
        }

        Point::new(easting, northing)
    }

    /// Convert UTM easting/northing back to WGS84 longitude/latitude
    pub fn utm_to_wgs84(&self, easting: f64, northing: f64, zone: u8, is_northern: bool) -> Point {
        let e2 = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        let x = easting - UTM_FALSE_EASTING;
        let y = if is_northern { northing } else { northing - UTM_FALSE_NORTHING_SOUTH };

        let m = y / UTM_K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let n1 = WGS84_A / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let t1 = tan_phi1 * tan_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let r1 = WGS84_A * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * UTM_K0);

        let phi = phi1 - (n1 * tan_phi1 / r1) * (d * d / 2.0
            - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
            + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1) * d.powi(6) / 720.0);

        let lambda = (d
            - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d.powi(5) / 120.0)
            / cos_phi1;

        Point::new(central_meridian(zone) + lambda.to_degrees(), phi.to_degrees())
    }

    /// Transform a point between coordinate systems
    pub fn transform_point(&self, point: &Point, from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> ScoutResult<Point> {
        if from_crs == to_crs {
            return Ok(*point);
        }

        // Everything goes through geographic coordinates
        let geographic = match from_crs {
            CoordinateSystem::WGS84 => *point,
            CoordinateSystem::WebMercator => self.web_mercator_to_wgs84(point.x, point.y),
            CoordinateSystem::UTM(zone, north) => self.utm_to_wgs84(point.x, point.y, *zone, *north),
            CoordinateSystem::Other(_) => return Err(unsupported(from_crs, to_crs)),
        };

        match to_crs {
            CoordinateSystem::WGS84 => Ok(geographic),
            CoordinateSystem::WebMercator => Ok(self.wgs84_to_web_mercator(geographic.x, geographic.y)),
            CoordinateSystem::UTM(zone, north) => Ok(self.wgs84_to_utm(geographic.x, geographic.y, *zone, *north)),
            CoordinateSystem::Other(_) => Err(unsupported(from_crs, to_crs)),
        }
    }

    /// Transform a bounding box between coordinate systems
    ///
    /// Each edge is densified before transforming and the envelope of all
    /// transformed points is returned, so curved edges stay covered.
    pub fn transform_bbox(&self, bbox: &BoundingBox, from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> ScoutResult<BoundingBox> {
        if from_crs == to_crs {
            return Ok(BoundingBox::new_with_crs(bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y, to_crs.epsg_code()));
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for i in 0..EDGE_SAMPLES {
            let t = i as f64 / (EDGE_SAMPLES - 1) as f64;
            let x = bbox.min_x + t * bbox.width();
            let y = bbox.min_y + t * bbox.height();

            let edge_points = [
                Point::new(x, bbox.min_y),
                Point::new(x, bbox.max_y),
                Point::new(bbox.min_x, y),
                Point::new(bbox.max_x, y),
            ];

            for p in edge_points {
                let q = self.transform_point(&p, from_crs, to_crs)?;
                min_x = min_x.min(q.x);
                min_y = min_y.min(q.y);
                max_x = max_x.max(q.x);
                max_y = max_y.max(q.y);
            }
        }

        Ok(BoundingBox::new_with_crs(min_x, min_y, max_x, max_y, to_crs.epsg_code()))
    }
}

/// Longitude of the central meridian of a UTM zone
pub fn central_meridian(zone: u8) -> f64 {
    (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

/// Distance along the meridian from the equator to latitude `phi` (radians)
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
        - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
        + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
        - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

fn unsupported(from_crs: &CoordinateSystem, to_crs: &CoordinateSystem) -> ScoutError {
    ScoutError::ProjectionError(format!(
        "Unsupported coordinate transformation from {} to {}",
        from_crs.description(), to_crs.description()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn central_meridian_maps_to_false_easting() {
        let t = CoordinateTransformer;
        let p = t.wgs84_to_utm(central_meridian(48), -7.5, 48, false);
        assert_abs_diff_eq!(p.x, 500_000.0, epsilon = 1e-6);
        assert!(p.y < UTM_FALSE_NORTHING_SOUTH && p.y > 9_000_000.0);

        let equator = t.wgs84_to_utm(central_meridian(31), 0.0, 31, true);
        assert_abs_diff_eq!(equator.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn utm_round_trip_is_stable() {
        let t = CoordinateTransformer;
        for (lon, lat, zone, north) in [
            (107.769191, -7.675039, 48, false),
            (120.375194, -5.552498, 51, false),
            (120.375194, -5.552498, 51, true),
            (9.18, 48.78, 32, true),
        ] {
            let p = t.wgs84_to_utm(lon, lat, zone, north);
            let back = t.utm_to_wgs84(p.x, p.y, zone, north);
            assert_abs_diff_eq!(back.x, lon, epsilon = 1e-6);
            assert_abs_diff_eq!(back.y, lat, epsilon = 1e-6);
        }
    }

    #[test]
    fn northern_zone_gives_negative_northing_south_of_equator() {
        let t = CoordinateTransformer;
        let north = t.wgs84_to_utm(120.375194, -5.552498, 51, true);
        let south = t.wgs84_to_utm(120.375194, -5.552498, 51, false);
        assert!(north.y < 0.0);
        assert_abs_diff_eq!(south.y - north.y, UTM_FALSE_NORTHING_SOUTH, epsilon = 1e-6);
    }

    #[test]
    fn web_mercator_round_trip() {
        let t = CoordinateTransformer;
        let p = t.transform_point(&Point::new(107.77, -7.68), &CoordinateSystem::WGS84, &CoordinateSystem::WebMercator).unwrap();
        let back = t.transform_point(&p, &CoordinateSystem::WebMercator, &CoordinateSystem::WGS84).unwrap();
        assert_abs_diff_eq!(back.x, 107.77, epsilon = 1e-9);
        assert_abs_diff_eq!(back.y, -7.68, epsilon = 1e-9);
    }

    #[test]
    fn reprojected_box_covers_source_corners() {
        let t = CoordinateTransformer;
        let bbox = BoundingBox::around(-7.675039, 107.769191, 500.0);
        let utm = CoordinateSystem::UTM(48, false);
        let projected = t.transform_bbox(&bbox, &CoordinateSystem::WGS84, &utm).unwrap();

        assert_eq!(projected.epsg, Some(32748));
        // Roughly a 1 km square
        assert!((projected.width() - 1000.0).abs() < 10.0);
        assert!((projected.height() - 1000.0).abs() < 10.0);

        for (x, y) in [(bbox.min_x, bbox.min_y), (bbox.max_x, bbox.max_y)] {
            let p = t.wgs84_to_utm(x, y, 48, false);
            assert!(p.x >= projected.min_x - 1e-6 && p.x <= projected.max_x + 1e-6);
            assert!(p.y >= projected.min_y - 1e-6 && p.y <= projected.max_y + 1e-6);
        }
    }

    #[test]
    fn unknown_crs_is_rejected() {
        let t = CoordinateTransformer;
        let result = t.transform_point(&Point::new(0.0, 0.0), &CoordinateSystem::WGS84, &CoordinateSystem::Other(2193));
        assert!(result.is_err());
    }
}
