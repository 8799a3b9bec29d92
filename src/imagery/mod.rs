//! Scene cropping
//!
//! Turns a selected scene and a feature box into a 3-channel 8-bit array.

mod array;
mod cog_cropper;
mod normalize;

pub use array::{ImageArray, CHANNELS};
pub use cog_cropper::{crop_bands, crop_source, crop_visual, CogCropper, BAND_ASSETS, VISUAL_ASSET};
pub use normalize::{min_max_to_u8, narrow_to_u8};

use crate::coordinate::BoundingBox;
use crate::errors::ScoutResult;
use crate::scene::SceneChoice;

/// Produces the image array of a scene clipped to a box in EPSG:4326
pub trait SceneCropper {
    fn crop(&self, choice: &SceneChoice, bbox: &BoundingBox) -> ScoutResult<ImageArray>;
}
