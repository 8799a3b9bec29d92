//! Shared window assembly for strips and tiles
//!
//! Strips are treated as tiles spanning the full image width, so one grid
//! walk serves both organizations.

use std::io::SeekFrom;
use log::trace;
use ndarray::Array3;

use crate::errors::{ScoutError, ScoutResult};
use crate::io::seekable::SeekableReader;

use super::region::Region;
use super::sample_layout::SampleLayout;

/// Grid of stored chunks (strips or tiles) covering one image
pub struct ChunkGrid {
    /// Width of one chunk in pixels
    pub chunk_width: u32,
    /// Nominal height of one chunk in pixels
    pub chunk_height: u32,
    /// Chunks per row of the grid
    pub across: u32,
    /// Chunk rows in the grid
    pub down: u32,
    /// File offset of every chunk
    pub offsets: Vec<u64>,
    /// Stored size of every chunk
    pub byte_counts: Vec<u64>,
}

impl ChunkGrid {
    /// Index of a chunk in the offset tables
    fn index(&self, plane: usize, cx: u32, cy: u32) -> usize {
        plane * (self.across * self.down) as usize + (cy * self.across + cx) as usize
    }

    /// Reads the region into a `(sample, row, column)` array
    pub fn read_window(
        &self,
        reader: &mut dyn SeekableReader,
        layout: &SampleLayout,
        region: Region,
    ) -> ScoutResult<Array3<u16>> {
        if region.is_empty() || region.end_x() > layout.width || region.end_y() > layout.height {
            return Err(ScoutError::GenericError(format!(
                "Region {:?} outside {}x{} raster", region, layout.width, layout.height)));
        }

        let expected = self.across as usize * self.down as usize * layout.planes();
        if self.offsets.len() < expected || self.byte_counts.len() < expected {
            return Err(ScoutError::GenericError(format!(
                "Expected {} chunks, found {} offsets and {} byte counts",
                expected, self.offsets.len(), self.byte_counts.len())));
        }

        let mut window = Array3::<u16>::zeros((layout.samples, region.height as usize, region.width as usize));

        let first_cx = region.x / self.chunk_width;
        let last_cx = (region.end_x() - 1) / self.chunk_width;
        let first_cy = region.y / self.chunk_height;
        let last_cy = (region.end_y() - 1) / self.chunk_height;
        let spp = layout.samples_per_chunk();

        for plane in 0..layout.planes() {
            for cy in first_cy..=last_cy {
                for cx in first_cx..=last_cx {
                    let index = self.index(plane, cx, cy);
                    let stored = read_chunk(reader, self.offsets[index], self.byte_counts[index])?;
                    let (values, rows) = layout.decode_chunk(&stored, self.chunk_width as usize)?;
                    trace!("Chunk {} ({},{}) plane {}: {} rows", index, cx, cy, plane, rows);

                    let x0 = cx * self.chunk_width;
                    let y0 = cy * self.chunk_height;
                    for r in 0..rows as u32 {
                        let y = y0 + r;
                        if y < region.y || y >= region.end_y() {
                            continue;
                        }
                        for c in 0..self.chunk_width {
                            let x = x0 + c;
                            if !region.contains(x, y) {
                                continue;
                            }
                            let base = ((r * self.chunk_width + c) as usize) * spp;
                            for s in 0..spp {
                                let band = if layout.planar { plane } else { s };
                                window[[band, (y - region.y) as usize, (x - region.x) as usize]] = values[base + s];
                            }
                        }
                    }
                }
            }
        }

        Ok(window)
    }
}

fn read_chunk(reader: &mut dyn SeekableReader, offset: u64, byte_count: u64) -> ScoutResult<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;
    let mut stored = vec![0u8; byte_count as usize];
    reader.read_exact(&mut stored)?;
    Ok(stored)
}
