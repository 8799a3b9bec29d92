//! TIFF file format parsing module
//!
//! This module provides structures and functions for reading
//! TIFF and BigTIFF format files, including their GeoTIFF tags.

pub mod ifd;
pub mod types;
pub mod reader;
#[cfg(test)]
pub(crate) mod tests;
pub mod constants;
pub mod geo_key_parser;
pub(crate) mod validation;

pub use crate::io::byte_order::{BigEndianHandler, ByteOrder, ByteOrderHandler, LittleEndianHandler};
pub use ifd::{IFD, IFDEntry};
pub use reader::TiffReader;
pub use types::TIFF;
pub use geo_key_parser::{GeoInfo, GeoKeyEntry, GeoKeyParser, GeoTransform};
