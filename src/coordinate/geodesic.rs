//! Geodesic calculations on the WGS-84 ellipsoid

use super::point::Point;

/// WGS-84 semi-major axis in meters
pub const WGS84_A: f64 = 6_378_137.0;
/// WGS-84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const MAX_ITERATIONS: usize = 200;
const CONVERGENCE: f64 = 1e-12;

/// Point reached by travelling `distance` meters from `start` along the
/// initial `bearing` (degrees clockwise from north)
///
/// Vincenty's direct solution; accurate to well under a millimetre for the
/// distances used here.
pub fn destination(start: &Point, bearing: f64, distance: f64) -> Point {
    let a = WGS84_A;
    let f = WGS84_F;
    let b = a * (1.0 - f);

    let phi1 = start.lat().to_radians();
    let alpha1 = bearing.to_radians();
    let (sin_alpha1, cos_alpha1) = alpha1.sin_cos();

    let tan_u1 = (1.0 - f) * phi1.tan();
    let cos_u1 = 1.0 / (1.0 + tan_u1 * tan_u1).sqrt();
    let sin_u1 = tan_u1 * cos_u1;

    let sigma1 = tan_u1.atan2(cos_alpha1);
    let sin_alpha = cos_u1 * sin_alpha1;
    let cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
    let u_sq = cos_sq_alpha * (a * a - b * b) / (b * b);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));

    let mut sigma = distance / (b * big_a);
    let mut cos_2sigma_m;
    let mut iterations = 0;
    loop {
        cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
        let (sin_sigma, cos_sigma) = sigma.sin_cos();
        let delta_sigma = big_b * sin_sigma * (cos_2sigma_m + big_b / 4.0
            * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                - big_b / 6.0 * cos_2sigma_m * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                    * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));
        let next = distance / (b * big_a) + delta_sigma;
        iterations += 1;
        if (next - sigma).abs() < CONVERGENCE || iterations >= MAX_ITERATIONS {
            sigma = next;
            break;
        }
        sigma = next;
    }

    cos_2sigma_m = (2.0 * sigma1 + sigma).cos();
    let (sin_sigma, cos_sigma) = sigma.sin_cos();
    let tmp = sin_u1 * sin_sigma - cos_u1 * cos_sigma * cos_alpha1;
    let phi2 = (sin_u1 * cos_sigma + cos_u1 * sin_sigma * cos_alpha1)
        .atan2((1.0 - f) * (sin_alpha * sin_alpha + tmp * tmp).sqrt());
    let lambda = (sin_sigma * sin_alpha1).atan2(cos_u1 * cos_sigma - sin_u1 * sin_sigma * cos_alpha1);
    let c = f / 16.0 * cos_sq_alpha * (4.0 + f * (4.0 - 3.0 * cos_sq_alpha));
    let l = lambda - (1.0 - c) * f * sin_alpha
        * (sigma + c * sin_sigma * (cos_2sigma_m + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

    Point::from_lat_lon(phi2.to_degrees(), normalize_longitude(start.lon() + l.to_degrees()))
}

/// Wraps a longitude into [-180, 180)
pub fn normalize_longitude(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn zero_distance_stays_put() {
        let start = Point::from_lat_lon(-7.675039, 107.769191);
        let end = destination(&start, 45.0, 0.0);
        assert_abs_diff_eq!(end.lat(), start.lat(), epsilon = 1e-12);
        assert_abs_diff_eq!(end.lon(), start.lon(), epsilon = 1e-12);
    }

    #[test]
    fn one_degree_of_latitude_at_equator() {
        // A meridian degree at the equator is 110 574.4 m on WGS-84
        let end = destination(&Point::from_lat_lon(0.0, 0.0), 0.0, 110_574.389);
        assert_abs_diff_eq!(end.lat(), 1.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.lon(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn eastward_degree_on_equator() {
        // Equatorial circumference / 360
        let end = destination(&Point::from_lat_lon(0.0, 10.0), 90.0, 111_319.491);
        assert_abs_diff_eq!(end.lon(), 11.0, epsilon = 1e-5);
        assert_abs_diff_eq!(end.lat(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn longitude_wraps_at_antimeridian() {
        assert_abs_diff_eq!(normalize_longitude(181.0), -179.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(-181.0), 179.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalize_longitude(12.5), 12.5, epsilon = 1e-12);
    }
}
