//! On-disk persistence of cropped image arrays
//!
//! One file per point. Arrays are stored as `(height, width, channel)`,
//! either as `.npy` or as an 8-bit RGB image. The presence of the file is
//! the pipeline's cache.

mod npy;

pub use npy::{load_npy, read_npy, save_npy, write_npy};

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::{ImageFormat, RgbImage};
use log::debug;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::errors::{ScoutError, ScoutResult};
use crate::imagery::{ImageArray, CHANNELS};
use crate::pipeline::PointOfInterest;

/// File format of persisted arrays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    Npy,
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
}

impl ArrayFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArrayFormat::Npy => "npy",
            ArrayFormat::Png => "png",
            ArrayFormat::Jpg => "jpg",
        }
    }

    /// Format implied by a file extension
    pub fn from_path(path: &Path) -> ScoutResult<Self> {
        let ext = path.extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ScoutError::ArrayFormatError(format!("{} has no extension", path.display())))?;
        ext.parse()
    }
}

impl FromStr for ArrayFormat {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npy" => Ok(ArrayFormat::Npy),
            "png" => Ok(ArrayFormat::Png),
            "jpg" | "jpeg" => Ok(ArrayFormat::Jpg),
            other => Err(ScoutError::ArrayFormatError(format!("Unsupported array format: {}", other))),
        }
    }
}

impl fmt::Display for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// How artifact files are named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactNaming {
    /// `{uid}.{ext}`
    #[default]
    Uid,
    /// `{region}_{lat}_{lon}_{uid}.{ext}`
    Descriptive,
}

/// Directory of persisted image arrays
pub struct ArrayStore {
    dir: PathBuf,
    format: ArrayFormat,
    naming: ArtifactNaming,
}

impl ArrayStore {
    pub fn new<P: AsRef<Path>>(dir: P, format: ArrayFormat, naming: ArtifactNaming) -> Self {
        ArrayStore {
            dir: dir.as_ref().to_path_buf(),
            format,
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn format(&self) -> ArrayFormat {
        self.format
    }

    /// Artifact path of a point
    pub fn path_for(&self, point: &PointOfInterest) -> PathBuf {
        let stem = match self.naming {
            ArtifactNaming::Uid => point.uid.to_string(),
            ArtifactNaming::Descriptive => format!("{}_{}_{}_{}",
                point.region, point.latitude, point.longitude, point.uid),
        };
        self.dir.join(format!("{}.{}", stem, self.format.extension()))
    }

    pub fn exists(&self, point: &PointOfInterest) -> bool {
        self.path_for(point).is_file()
    }

    /// Persists the array of a point, creating the directory as needed
    pub fn save(&self, point: &PointOfInterest, image: &ImageArray) -> ScoutResult<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(point);
        save_array(&path, image)?;
        debug!("Saved {}x{} array to {}", image.height(), image.width(), path.display());
        Ok(path)
    }

    pub fn load(&self, point: &PointOfInterest) -> ScoutResult<ImageArray> {
        load_array(&self.path_for(point))
    }
}

/// Writes an array in the format given by the path's extension
pub fn save_array(path: &Path, image: &ImageArray) -> ScoutResult<()> {
    let hwc = image.to_hwc();

    match ArrayFormat::from_path(path)? {
        ArrayFormat::Npy => save_npy(path, &hwc),
        format => {
            let (height, width, _) = hwc.dim();
            let rgb = RgbImage::from_raw(width as u32, height as u32, hwc.into_raw_vec_and_offset().0)
                .ok_or_else(|| ScoutError::ArrayFormatError("Array does not fit an RGB image".to_string()))?;
            let image_format = match format {
                ArrayFormat::Png => ImageFormat::Png,
                _ => ImageFormat::Jpeg,
            };
            rgb.save_with_format(path, image_format)?;
            Ok(())
        }
    }
}

/// Reads an array saved by [`save_array`]
pub fn load_array(path: &Path) -> ScoutResult<ImageArray> {
    let hwc = match ArrayFormat::from_path(path)? {
        ArrayFormat::Npy => load_npy(path)?,
        _ => {
            let rgb = image::open(path)?.to_rgb8();
            let (width, height) = rgb.dimensions();
            Array3::from_shape_vec((height as usize, width as usize, CHANNELS), rgb.into_raw())
                .map_err(|e| ScoutError::ArrayFormatError(e.to_string()))?
        }
    };

    ImageArray::from_hwc(hwc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn point() -> PointOfInterest {
        PointOfInterest::new(3, -5.559804, 120.376871, "sulawesi", NaiveDate::from_ymd_opt(2022, 8, 31).unwrap())
    }

    fn sample_image() -> ImageArray {
        ImageArray::new(Array3::from_shape_fn((3, 6, 5), |(c, r, x)| (c * 70 + r * 9 + x) as u8)).unwrap()
    }

    #[test]
    fn naming_schemes() {
        let uid = ArrayStore::new("out", ArrayFormat::Npy, ArtifactNaming::Uid);
        assert_eq!(uid.path_for(&point()), Path::new("out/3.npy"));

        let descriptive = ArrayStore::new("out", ArrayFormat::Jpg, ArtifactNaming::Descriptive);
        assert_eq!(descriptive.path_for(&point()), Path::new("out/sulawesi_-5.559804_120.376871_3.jpg"));
    }

    #[test]
    fn npy_artifact_restores_array() {
        let dir = tempdir().unwrap();
        let store = ArrayStore::new(dir.path().join("arrays"), ArrayFormat::Npy, ArtifactNaming::Uid);

        assert!(!store.exists(&point()));
        store.save(&point(), &sample_image()).unwrap();
        assert!(store.exists(&point()));
        assert_eq!(store.load(&point()).unwrap(), sample_image());
    }

    #[test]
    fn png_artifact_restores_array() {
        let dir = tempdir().unwrap();
        let store = ArrayStore::new(dir.path(), ArrayFormat::Png, ArtifactNaming::Uid);

        store.save(&point(), &sample_image()).unwrap();
        assert_eq!(store.load(&point()).unwrap(), sample_image());
    }

    #[test]
    fn jpeg_artifact_keeps_shape() {
        let dir = tempdir().unwrap();
        let store = ArrayStore::new(dir.path(), ArrayFormat::Jpg, ArtifactNaming::Uid);

        store.save(&point(), &sample_image()).unwrap();
        let loaded = store.load(&point()).unwrap();
        assert_eq!(loaded.view().dim(), (3, 6, 5));
    }

    #[test]
    fn format_names() {
        assert_eq!("JPEG".parse::<ArrayFormat>().unwrap(), ArrayFormat::Jpg);
        assert_eq!(ArrayFormat::from_path(Path::new("a/1.npy")).unwrap(), ArrayFormat::Npy);
        assert!("tiff".parse::<ArrayFormat>().is_err());
    }
}
