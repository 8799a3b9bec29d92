//! Tile-based image data extraction
//!
//! Tiled TIFF files organize image data in rectangular tiles of equal size,
//! which is how Cloud-Optimized GeoTIFFs are written. Only the tiles that
//! intersect the requested region are fetched.

use log::debug;
use ndarray::Array3;

use crate::errors::{ScoutError, ScoutResult};
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::chunk_grid::ChunkGrid;
use super::region::Region;
use super::sample_layout::SampleLayout;
use super::WindowReader;

/// Reads image windows from tiled TIFF files
pub struct TileReader<'a> {
    /// IFD containing the image metadata
    ifd: &'a IFD,
    /// TIFF reader for accessing tag values
    tiff_reader: &'a TiffReader,
}

impl<'a> TileReader<'a> {
    /// Create a new tile reader
    pub fn new(ifd: &'a IFD, tiff_reader: &'a TiffReader) -> Self {
        TileReader { ifd, tiff_reader }
    }

    /// Get tile dimensions from the IFD
    fn get_tile_dimensions(&self) -> ScoutResult<(u32, u32)> {
        let tile_width = self.ifd.get_tag_value(tags::TILE_WIDTH)
            .ok_or(ScoutError::TagNotFound(tags::TILE_WIDTH))? as u32;
        let tile_height = self.ifd.get_tag_value(tags::TILE_LENGTH)
            .ok_or(ScoutError::TagNotFound(tags::TILE_LENGTH))? as u32;

        if tile_width == 0 || tile_height == 0 {
            return Err(ScoutError::GenericError("Tile dimensions must be positive".to_string()));
        }

        Ok((tile_width, tile_height))
    }
}

impl WindowReader for TileReader<'_> {
    fn read_window(
        &self,
        reader: &mut dyn SeekableReader,
        layout: &SampleLayout,
        region: Region,
    ) -> ScoutResult<Array3<u16>> {
        let (tile_width, tile_height) = self.get_tile_dimensions()?;

        let grid = ChunkGrid {
            chunk_width: tile_width,
            chunk_height: tile_height,
            across: (layout.width + tile_width - 1) / tile_width,
            down: (layout.height + tile_height - 1) / tile_height,
            offsets: self.tiff_reader.read_tag_u64s(reader, self.ifd, tags::TILE_OFFSETS)?,
            byte_counts: self.tiff_reader.read_tag_u64s(reader, self.ifd, tags::TILE_BYTE_COUNTS)?,
        };

        debug!("Tiles {}x{}, grid {}x{}, window {:?}",
               tile_width, tile_height, grid.across, grid.down, region);

        grid.read_window(reader, layout, region)
    }
}
