//! Seekable reader trait
//!
//! TIFF decoding only needs `Read + Seek`; local files, in-memory cursors
//! and the HTTP range reader all satisfy it.

use std::io::{Read, Seek};

/// Trait for readers that can both read and seek
pub trait SeekableReader: Read + Seek + Send + Sync {}

// Blanket implementation for any type that implements the required traits
impl<T: Read + Seek + Send + Sync> SeekableReader for T {}
