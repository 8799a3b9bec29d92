//! Custom error types for scene search, raster decoding and persistence

use std::fmt;
use std::io;

use crate::io::http_range::strip_query;

/// Error types raised anywhere in the pipeline
#[derive(Debug)]
pub enum ScoutError {
    /// I/O error
    IoError(io::Error),
    /// Invalid TIFF header
    InvalidHeader,
    /// Invalid byte order marker
    InvalidByteOrder(u16),
    /// Invalid BigTIFF header
    InvalidBigTIFFHeader,
    /// Unsupported TIFF version
    UnsupportedVersion(u16),
    /// Tag not found
    TagNotFound(u16),
    /// Unsupported field type
    UnsupportedFieldType(u16),
    /// Unsupported compression method
    UnsupportedCompression(u64),
    /// Image dimensions not found
    MissingDimensions,
    /// Remote request failed or returned a non-success status
    HttpError(String),
    /// Catalog response could not be interpreted
    CatalogError(String),
    /// Configuration file is missing values or inconsistent
    ConfigError(String),
    /// Coordinate transformation is not possible
    ProjectionError(String),
    /// Persisted array has an unexpected layout
    ArrayFormatError(String),
    /// Generic error with message
    GenericError(String),
}

impl fmt::Display for ScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoutError::IoError(e) => write!(f, "I/O error: {}", e),
            ScoutError::InvalidHeader => write!(f, "Invalid TIFF header"),
            ScoutError::InvalidByteOrder(v) => write!(f, "Invalid byte order marker: {:#06x}", v),
            ScoutError::InvalidBigTIFFHeader => write!(f, "Invalid BigTIFF header"),
            ScoutError::UnsupportedVersion(v) => write!(f, "Unsupported TIFF version: {}", v),
            ScoutError::TagNotFound(tag) => write!(f, "Tag not found: {}", tag),
            ScoutError::UnsupportedFieldType(ft) => write!(f, "Unsupported field type: {}", ft),
            ScoutError::UnsupportedCompression(c) => write!(f, "Unsupported compression method: {}", c),
            ScoutError::MissingDimensions => write!(f, "Image dimensions not found"),
            ScoutError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ScoutError::CatalogError(msg) => write!(f, "Catalog error: {}", msg),
            ScoutError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ScoutError::ProjectionError(msg) => write!(f, "Projection error: {}", msg),
            ScoutError::ArrayFormatError(msg) => write!(f, "Array format error: {}", msg),
            ScoutError::GenericError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ScoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScoutError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ScoutError {
    fn from(error: io::Error) -> Self {
        ScoutError::IoError(error)
    }
}

/// Signed asset URLs carry their token in the query string; only the path
/// part of a failing URL is kept in the message.
impl From<reqwest::Error> for ScoutError {
    fn from(error: reqwest::Error) -> Self {
        let url = error.url().map(|url| strip_query(url.as_str()).to_string());
        let error = error.without_url();
        match url {
            Some(url) => ScoutError::HttpError(format!("{} ({})", error, url)),
            None => ScoutError::HttpError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for ScoutError {
    fn from(error: serde_json::Error) -> Self {
        ScoutError::CatalogError(format!("Invalid JSON: {}", error))
    }
}

impl From<csv::Error> for ScoutError {
    fn from(error: csv::Error) -> Self {
        ScoutError::GenericError(format!("CSV error: {}", error))
    }
}

impl From<toml::de::Error> for ScoutError {
    fn from(error: toml::de::Error) -> Self {
        ScoutError::ConfigError(error.to_string())
    }
}

impl From<image::ImageError> for ScoutError {
    fn from(error: image::ImageError) -> Self {
        ScoutError::ArrayFormatError(format!("Image codec error: {}", error))
    }
}

impl From<String> for ScoutError {
    fn from(msg: String) -> Self {
        ScoutError::GenericError(msg)
    }
}

/// Result type used across the crate
pub type ScoutResult<T> = Result<T, ScoutError>;
