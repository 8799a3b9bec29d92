//! Handler for ZSTD compressed data

use crate::errors::{ScoutError, ScoutResult};
use super::handler::CompressionHandler;
use log::trace;

/// ZSTD compression handler (compression code 14)
pub struct ZstdHandler {
    /// Compression level (1-22, default 3)
    compression_level: i32,
}

impl ZstdHandler {
    /// Create a new ZSTD handler with default compression level
    pub fn new() -> Self {
        ZstdHandler {
            compression_level: 3
        }
    }
}

impl Default for ZstdHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CompressionHandler for ZstdHandler {
    fn decompress(&self, data: &[u8]) -> ScoutResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let decompressed_data = zstd::decode_all(data)
            .map_err(|e| ScoutError::GenericError(format!("ZSTD decompression error: {}", e)))?;
        trace!("ZSTD {} -> {} bytes", data.len(), decompressed_data.len());
        Ok(decompressed_data)
    }

    fn compress(&self, data: &[u8]) -> ScoutResult<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }

        zstd::encode_all(data, self.compression_level)
            .map_err(|e| ScoutError::GenericError(format!("ZSTD compression error: {}", e)))
    }

    fn name(&self) -> &'static str {
        "ZSTD"
    }
}
