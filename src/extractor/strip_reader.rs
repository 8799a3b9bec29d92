//! Strip-based image data extraction
//!
//! Stripped TIFFs organize image data in horizontal strips across the entire
//! width of the image. Only the strips covering the requested rows are read.

use log::debug;
use ndarray::Array3;

use crate::errors::ScoutResult;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::tags;
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;

use super::chunk_grid::ChunkGrid;
use super::region::Region;
use super::sample_layout::SampleLayout;
use super::WindowReader;

/// Reads image windows from stripped TIFF files
pub struct StripReader<'a> {
    /// IFD containing the image metadata
    ifd: &'a IFD,
    /// TIFF reader for accessing tag values
    tiff_reader: &'a TiffReader,
}

impl<'a> StripReader<'a> {
    /// Create a new strip reader
    pub fn new(ifd: &'a IFD, tiff_reader: &'a TiffReader) -> Self {
        StripReader { ifd, tiff_reader }
    }

    /// Rows per strip, defaulting to the whole image
    fn rows_per_strip(&self, image_height: u32) -> u32 {
        self.ifd.get_tag_value(tags::ROWS_PER_STRIP)
            .map(|rows| rows.min(image_height as u64) as u32)
            .filter(|rows| *rows > 0)
            .unwrap_or(image_height)
    }
}

impl WindowReader for StripReader<'_> {
    fn read_window(
        &self,
        reader: &mut dyn SeekableReader,
        layout: &SampleLayout,
        region: Region,
    ) -> ScoutResult<Array3<u16>> {
        let rows_per_strip = self.rows_per_strip(layout.height);

        let grid = ChunkGrid {
            chunk_width: layout.width,
            chunk_height: rows_per_strip,
            across: 1,
            down: (layout.height + rows_per_strip - 1) / rows_per_strip,
            offsets: self.tiff_reader.read_tag_u64s(reader, self.ifd, tags::STRIP_OFFSETS)?,
            byte_counts: self.tiff_reader.read_tag_u64s(reader, self.ifd, tags::STRIP_BYTE_COUNTS)?,
        };

        debug!("Rows per strip: {}, total strips: {}", rows_per_strip, grid.offsets.len());

        grid.read_window(reader, layout, region)
    }
}
