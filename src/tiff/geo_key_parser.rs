//! GeoTIFF Metadata and GeoKey parsing functionality
//!
//! Reads the GeoKey directory and the model tags of an IFD and turns them
//! into an EPSG code plus an affine geotransform.

use log::debug;

use crate::errors::{ScoutError, ScoutResult};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{geo_keys, model_type, tags};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

/// Represents one GeoKey entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoKeyEntry {
    /// Key identifier
    pub key_id: u16,
    /// Tag holding the value, or 0 when the value is stored in `value_offset`
    pub tiff_tag_location: u16,
    /// Number of values
    pub count: u16,
    /// Value, or index into the referenced tag
    pub value_offset: u16,
}

impl GeoKeyEntry {
    /// Creates a new GeoKey entry
    pub fn new(key_id: u16, tiff_tag_location: u16, count: u16, value_offset: u16) -> Self {
        GeoKeyEntry { key_id, tiff_tag_location, count, value_offset }
    }
}

/// Affine mapping from pixel (column, row) to model coordinates
///
/// Uses the six-coefficient layout `[origin_x, pixel_width, row_rotation,
/// origin_y, column_rotation, pixel_height]`; `pixel_height` is negative for
/// north-up rasters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// Builds a north-up transform from pixel scale and one tiepoint
    pub fn from_scale_and_tiepoint(scale: &[f64], tiepoint: &[f64]) -> ScoutResult<Self> {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(ScoutError::ProjectionError(
                "ModelPixelScale needs 2 values and ModelTiepoint 6".to_string()));
        }

        let (i, j) = (tiepoint[0], tiepoint[1]);
        let (x, y) = (tiepoint[3], tiepoint[4]);
        let (sx, sy) = (scale[0], scale[1]);

        Ok(GeoTransform([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]))
    }

    /// Builds a transform from a 4x4 ModelTransformation matrix (row-major)
    pub fn from_matrix(matrix: &[f64]) -> ScoutResult<Self> {
        if matrix.len() < 16 {
            return Err(ScoutError::ProjectionError(
                format!("ModelTransformation needs 16 values, got {}", matrix.len())));
        }

        Ok(GeoTransform([matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5]]))
    }

    /// Model coordinates of a pixel corner
    pub fn pixel_to_model(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (g[0] + col * g[1] + row * g[2], g[3] + col * g[4] + row * g[5])
    }

    /// Fractional pixel coordinates of a model position
    pub fn model_to_pixel(&self, x: f64, y: f64) -> ScoutResult<(f64, f64)> {
        let g = &self.0;
        let det = g[1] * g[5] - g[2] * g[4];
        if det.abs() < f64::EPSILON {
            return Err(ScoutError::ProjectionError("Geotransform is not invertible".to_string()));
        }

        let dx = x - g[0];
        let dy = y - g[3];
        let col = (g[5] * dx - g[2] * dy) / det;
        let row = (g[1] * dy - g[4] * dx) / det;
        Ok((col, row))
    }
}

/// Georeferencing of one raster
#[derive(Debug, Clone, Copy)]
pub struct GeoInfo {
    /// EPSG code of the raster's coordinate system
    pub epsg_code: u32,
    /// GeoTIFF model type (projected or geographic)
    pub model_type: u16,
    /// Pixel to model mapping
    pub transform: GeoTransform,
}

/// Parser for GeoTIFF geographic metadata
pub struct GeoKeyParser;

impl GeoKeyParser {
    /// Parse the GeoKey directory from an IFD
    ///
    /// The directory is a flat SHORT array: a 4-value header
    /// (version, revision, minor revision, key count) followed by 4 values
    /// per key.
    pub fn parse_geo_key_directory(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD,
    ) -> ScoutResult<Vec<GeoKeyEntry>> {
        if !ifd.has_tag(tags::GEO_KEY_DIRECTORY_TAG) {
            return Ok(Vec::new());
        }

        let values = tiff_reader.read_tag_u64s(reader, ifd, tags::GEO_KEY_DIRECTORY_TAG)?;
        if values.len() < 4 {
            return Err(ScoutError::GenericError("Invalid GeoKey directory header".to_string()));
        }

        let num_keys = values[3] as usize;
        debug!("GeoKey directory: version={}, revision={}.{}, keys={}",
               values[0], values[1], values[2], num_keys);

        let keys = values[4..]
            .chunks_exact(4)
            .take(num_keys)
            .map(|k| GeoKeyEntry::new(k[0] as u16, k[1] as u16, k[2] as u16, k[3] as u16))
            .collect();

        Ok(keys)
    }

    /// Extract the EPSG code and geotransform of an IFD
    pub fn extract_geo_info(
        reader: &mut dyn SeekableReader,
        tiff_reader: &TiffReader,
        ifd: &IFD,
    ) -> ScoutResult<GeoInfo> {
        let keys = Self::parse_geo_key_directory(reader, tiff_reader, ifd)?;

        let key_value = |id: u16| keys.iter()
            .find(|k| k.key_id == id && k.tiff_tag_location == 0)
            .map(|k| k.value_offset);

        let model = key_value(geo_keys::MODEL_TYPE).unwrap_or(0);
        let epsg_code = match model {
            model_type::GEOGRAPHIC => key_value(geo_keys::GEOGRAPHIC_TYPE),
            _ => key_value(geo_keys::PROJECTED_CS_TYPE).or_else(|| key_value(geo_keys::GEOGRAPHIC_TYPE)),
        };

        let epsg_code = match epsg_code {
            Some(code) if code != 0 && code != 32767 => code as u32,
            _ => return Err(ScoutError::ProjectionError(
                "Raster has no EPSG-coded coordinate system".to_string())),
        };

        let transform = if ifd.has_tag(tags::MODEL_TRANSFORMATION_TAG) {
            let matrix = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_TRANSFORMATION_TAG)?;
            GeoTransform::from_matrix(&matrix)?
        } else {
            let scale = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_PIXEL_SCALE_TAG)?;
            let tiepoint = tiff_reader.read_tag_f64s(reader, ifd, tags::MODEL_TIEPOINT_TAG)?;
            GeoTransform::from_scale_and_tiepoint(&scale, &tiepoint)?
        };

        debug!("Raster georeferencing: EPSG:{} transform {:?}", epsg_code, transform.0);

        Ok(GeoInfo {
            epsg_code,
            model_type: model,
            transform,
        })
    }
}
