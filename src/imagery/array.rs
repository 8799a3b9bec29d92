//! Three-channel 8-bit image arrays

use ndarray::{Array3, ArrayView3, Axis};

use crate::errors::{ScoutError, ScoutResult};

/// Number of channels every image array carries
pub const CHANNELS: usize = 3;

/// A cropped scene shaped `(channel, height, width)`
#[derive(Debug, Clone, PartialEq)]
pub struct ImageArray(Array3<u8>);

impl ImageArray {
    /// Wraps a channel-first array, rejecting anything but 3 channels
    pub fn new(data: Array3<u8>) -> ScoutResult<Self> {
        if data.len_of(Axis(0)) != CHANNELS {
            return Err(ScoutError::ArrayFormatError(format!(
                "Expected {} channels, got {}", CHANNELS, data.len_of(Axis(0)))));
        }
        Ok(ImageArray(data))
    }

    /// Builds an array from `(height, width, channel)` data
    pub fn from_hwc(data: Array3<u8>) -> ScoutResult<Self> {
        Self::new(data.permuted_axes([2, 0, 1]).as_standard_layout().into_owned())
    }

    /// Copy laid out as `(height, width, channel)`, row-major
    pub fn to_hwc(&self) -> Array3<u8> {
        self.0.view().permuted_axes([1, 2, 0]).as_standard_layout().into_owned()
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.0.view()
    }

    pub fn into_inner(self) -> Array3<u8> {
        self.0
    }

    pub fn height(&self) -> usize {
        self.0.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.0.len_of(Axis(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_channel_count() {
        assert!(ImageArray::new(Array3::zeros((4, 2, 2))).is_err());
        assert!(ImageArray::new(Array3::zeros((1, 2, 2))).is_err());
        assert!(ImageArray::new(Array3::zeros((3, 2, 2))).is_ok());
    }

    #[test]
    fn hwc_transposition() {
        let data = Array3::from_shape_fn((3, 2, 4), |(c, r, x)| (c * 100 + r * 10 + x) as u8);
        let image = ImageArray::new(data).unwrap();

        let hwc = image.to_hwc();
        assert_eq!(hwc.dim(), (2, 4, 3));
        assert_eq!(hwc[[1, 3, 2]], 213);
        assert!(hwc.is_standard_layout());

        assert_eq!(ImageArray::from_hwc(hwc).unwrap(), image);
        assert_eq!((image.height(), image.width()), (2, 4));
    }
}
