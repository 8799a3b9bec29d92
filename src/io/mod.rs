//! I/O utilities for raster access
//!
//! Traits and readers shared by the TIFF decoder: byte order strategies,
//! the seekable reader abstraction and a reader over HTTP byte ranges.

pub mod seekable;
pub mod byte_order;
pub mod http_range;
