//! Per-channel summary features of an image array

use std::fmt;

use ndarray::Axis;
use serde::Serialize;

use crate::imagery::{ImageArray, CHANNELS};

/// Column names of a feature vector, in order
pub const FEATURE_NAMES: [&str; 6] = ["mean_r", "mean_g", "mean_b", "median_r", "median_g", "median_b"];

/// Three channel means followed by three channel medians
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector(pub [f64; 6]);

impl FeatureVector {
    pub fn means(&self) -> &[f64] {
        &self.0[..CHANNELS]
    }

    pub fn medians(&self) -> &[f64] {
        &self.0[CHANNELS..]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", values.join(","))
    }
}

/// Reduces an array to its per-channel means and medians
///
/// An empty spatial extent gives NaN for every value.
pub fn extract_features(image: &ImageArray) -> FeatureVector {
    let mut values = [f64::NAN; 6];

    for (c, channel) in image.view().axis_iter(Axis(0)).enumerate() {
        let mut pixels: Vec<u8> = channel.iter().copied().collect();
        if pixels.is_empty() {
            continue;
        }

        let sum: f64 = pixels.iter().map(|v| *v as f64).sum();
        values[c] = sum / pixels.len() as f64;

        pixels.sort_unstable();
        values[CHANNELS + c] = median_of_sorted(&pixels);
    }

    FeatureVector(values)
}

fn median_of_sorted(sorted: &[u8]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
    } else {
        sorted[mid] as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn constant_image_gives_constant_features() {
        let image = ImageArray::new(Array3::from_elem((3, 4, 4), 42u8)).unwrap();
        let features = extract_features(&image);
        assert!(features.as_slice().iter().all(|v| *v == 42.0));
        assert_eq!(extract_features(&image), features);
    }

    #[test]
    fn means_and_medians_per_channel() {
        // Channel c holds c*10 + [1, 2, 3, 10]
        let image = ImageArray::new(Array3::from_shape_fn((3, 2, 2), |(c, r, x)| {
            let base = [1u8, 2, 3, 10][r * 2 + x];
            c as u8 * 10 + base
        })).unwrap();

        let features = extract_features(&image);
        assert_relative_eq!(features.means()[0], 4.0);
        assert_relative_eq!(features.means()[2], 24.0);
        assert_relative_eq!(features.medians()[0], 2.5);
        assert_relative_eq!(features.medians()[1], 12.5);
    }

    #[test]
    fn odd_count_median_is_middle_value() {
        let image = ImageArray::new(Array3::from_shape_fn((3, 1, 3), |(_, _, x)| [9u8, 1, 5][x])).unwrap();
        assert_eq!(extract_features(&image).medians(), &[5.0, 5.0, 5.0]);
    }

    #[test]
    fn empty_extent_is_nan() {
        let image = ImageArray::new(Array3::zeros((3, 0, 4))).unwrap();
        assert!(extract_features(&image).as_slice().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn csv_rendering() {
        let features = FeatureVector([1.0, 2.5, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(features.to_string(), "1,2.5,3,4,5,6");
    }
}
