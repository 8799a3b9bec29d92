//! Pixel window extraction from GeoTIFF rasters
//!
//! A `WindowReader` strategy exists for each data organization (strips and
//! tiles); `GeoTiffExtractor` picks the right one for an opened file.

mod region;
mod sample_layout;
mod chunk_grid;
mod tile_reader;
mod strip_reader;
mod geotiff_extractor;

use ndarray::Array3;

use crate::errors::ScoutResult;
use crate::io::seekable::SeekableReader;

pub use region::Region;
pub use sample_layout::SampleLayout;
pub use tile_reader::TileReader;
pub use strip_reader::StripReader;
pub use geotiff_extractor::GeoTiffExtractor;

/// Strategy for reading a pixel window out of one image
pub trait WindowReader {
    /// Reads `region` as a `(sample, row, column)` array
    fn read_window(
        &self,
        reader: &mut dyn SeekableReader,
        layout: &SampleLayout,
        region: Region,
    ) -> ScoutResult<Array3<u16>>;
}
