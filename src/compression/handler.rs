//! Compression handler trait definition

use crate::errors::ScoutResult;

/// Strategy trait for handling different compression methods
pub trait CompressionHandler: Send + Sync {
    /// Decompress one strip or tile
    fn decompress(&self, data: &[u8]) -> ScoutResult<Vec<u8>>;

    /// Compress one strip or tile
    fn compress(&self, data: &[u8]) -> ScoutResult<Vec<u8>>;

    /// Get the name of this compression method
    fn name(&self) -> &'static str;
}
