//! Value conversions from decoded samples to 8-bit channels

use ndarray::Array3;

use crate::errors::{ScoutError, ScoutResult};

/// Linearly rescales all values so the minimum maps to 0 and the maximum to 255
///
/// The range is global over the whole array. A constant array maps to 0.
pub fn min_max_to_u8(data: &Array3<u16>) -> Array3<u8> {
    let min = data.iter().copied().min().unwrap_or(0);
    let max = data.iter().copied().max().unwrap_or(0);

    if max == min {
        return Array3::zeros(data.raw_dim());
    }

    let scale = 255.0 / (max - min) as f64;
    data.mapv(|v| ((v - min) as f64 * scale).round() as u8)
}

/// Narrows 8-bit samples carried as u16, keeping values unchanged
pub fn narrow_to_u8(data: &Array3<u16>) -> ScoutResult<Array3<u8>> {
    if let Some(v) = data.iter().find(|v| **v > u8::MAX as u16) {
        return Err(ScoutError::ArrayFormatError(format!(
            "Sample value {} does not fit in 8 bits", v)));
    }
    Ok(data.mapv(|v| v as u8))
}
