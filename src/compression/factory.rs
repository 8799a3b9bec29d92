//! Factory for creating compression handlers

use crate::errors::{ScoutError, ScoutResult};
use crate::tiff::constants::compression;
use super::handler::CompressionHandler;
use super::uncompressed::UncompressedHandler;
use super::deflate::AdobeDeflateHandler;
use super::zstd::ZstdHandler;

/// Factory for creating compression handlers
pub struct CompressionFactory;

impl CompressionFactory {
    /// Create a compression handler for the given TIFF compression code
    pub fn create_handler(code: u64) -> ScoutResult<Box<dyn CompressionHandler>> {
        match code {
            c if c == compression::NONE as u64 => Ok(Box::new(UncompressedHandler)),
            c if c == compression::DEFLATE as u64 || c == compression::DEFLATE_LEGACY as u64 => {
                Ok(Box::new(AdobeDeflateHandler))
            },
            c if c == compression::ZSTD as u64 => Ok(Box::new(ZstdHandler::new())),
            _ => Err(ScoutError::UnsupportedCompression(code))
        }
    }
}
