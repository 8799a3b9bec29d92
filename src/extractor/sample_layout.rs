//! Sample layout of a TIFF image and decoding of single strips or tiles
//!
//! Everything needed to turn the stored bytes of one chunk back into sample
//! values: compression, predictor, bit depth, byte order and how samples are
//! interleaved.

use log::debug;

use crate::compression::{CompressionFactory, CompressionHandler};
use crate::errors::{ScoutError, ScoutResult};
use crate::io::byte_order::ByteOrder;
use crate::io::seekable::SeekableReader;
use crate::tiff::constants::{planar_config, predictor, sample_format, tags};
use crate::tiff::ifd::IFD;
use crate::tiff::reader::TiffReader;
use crate::tiff::validation;

/// How the samples of an image are stored
pub struct SampleLayout {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Samples per pixel
    pub samples: usize,
    /// Bits per sample (8 or 16)
    pub bits: u16,
    /// Whether each sample is stored in its own plane
    pub planar: bool,
    /// Whether horizontal differencing was applied before compression
    pub horizontal_predictor: bool,
    /// Byte order of 16-bit samples
    pub byte_order: ByteOrder,
    handler: Box<dyn CompressionHandler>,
}

impl SampleLayout {
    /// Reads the layout tags of an IFD
    pub fn from_ifd(reader: &mut dyn SeekableReader, tiff_reader: &TiffReader, ifd: &IFD) -> ScoutResult<Self> {
        let (width, height) = ifd.get_dimensions().ok_or(ScoutError::MissingDimensions)?;
        let samples = ifd.get_samples_per_pixel();
        validation::validate_range(samples, 1, 16, "samples per pixel")?;

        let bits_per_sample = if ifd.has_tag(tags::BITS_PER_SAMPLE) {
            tiff_reader.read_tag_u64s(reader, ifd, tags::BITS_PER_SAMPLE)?
        } else {
            vec![1]
        };
        let bits = bits_per_sample.first().copied().unwrap_or(1);
        if bits_per_sample.iter().any(|b| *b != bits) || (bits != 8 && bits != 16) {
            return Err(ScoutError::GenericError(format!(
                "Unsupported bits per sample: {:?}", bits_per_sample)));
        }

        if ifd.has_tag(tags::SAMPLE_FORMAT) {
            let formats = tiff_reader.read_tag_u64s(reader, ifd, tags::SAMPLE_FORMAT)?;
            if formats.iter().any(|f| *f != sample_format::UNSIGNED as u64) {
                return Err(ScoutError::GenericError(format!(
                    "Unsupported sample format: {:?}", formats)));
            }
        }

        let compression = ifd.get_tag_value(tags::COMPRESSION).unwrap_or(1);
        let handler = CompressionFactory::create_handler(compression)?;

        let predictor_code = ifd.get_tag_value(tags::PREDICTOR).unwrap_or(predictor::NONE as u64);
        let horizontal_predictor = match predictor_code {
            p if p == predictor::NONE as u64 => false,
            p if p == predictor::HORIZONTAL_DIFFERENCING as u64 => true,
            other => return Err(ScoutError::GenericError(format!("Unsupported predictor: {}", other))),
        };

        let planar = ifd.get_tag_value(tags::PLANAR_CONFIGURATION)
            .map(|v| v == planar_config::PLANAR as u64)
            .unwrap_or(false);

        let byte_order = tiff_reader.byte_order()
            .ok_or_else(|| ScoutError::GenericError("Byte order not yet determined".to_string()))?;

        debug!("{}x{} raster, {} x {}-bit samples, {}, {}{}",
               width, height, samples, bits, handler.name(),
               if planar { "planar" } else { "chunky" },
               if horizontal_predictor { ", predictor 2" } else { "" });

        Ok(SampleLayout {
            width: width as u32,
            height: height as u32,
            samples: samples as usize,
            bits: bits as u16,
            planar,
            horizontal_predictor,
            byte_order,
            handler,
        })
    }

    /// Samples interleaved within one chunk
    pub fn samples_per_chunk(&self) -> usize {
        if self.planar { 1 } else { self.samples }
    }

    /// Number of separately stored planes
    pub fn planes(&self) -> usize {
        if self.planar { self.samples } else { 1 }
    }

    fn bytes_per_sample(&self) -> usize {
        (self.bits / 8) as usize
    }

    /// Decodes one stored chunk into sample values, row-major
    ///
    /// Returns the samples and the number of complete rows they hold; the
    /// last strip of an image may hold fewer rows than the nominal height.
    pub fn decode_chunk(&self, stored: &[u8], chunk_width: usize) -> ScoutResult<(Vec<u16>, usize)> {
        let bytes = self.handler.decompress(stored)?;
        let spp = self.samples_per_chunk();
        let row_len = chunk_width * spp;
        let row_bytes = row_len * self.bytes_per_sample();
        if row_bytes == 0 {
            return Ok((Vec::new(), 0));
        }

        let rows = bytes.len() / row_bytes;
        let mut values: Vec<u16> = match self.bits {
            8 => bytes[..rows * row_bytes].iter().map(|b| *b as u16).collect(),
            _ => bytes[..rows * row_bytes]
                .chunks_exact(2)
                .map(|pair| match self.byte_order {
                    ByteOrder::LittleEndian => u16::from_le_bytes([pair[0], pair[1]]),
                    ByteOrder::BigEndian => u16::from_be_bytes([pair[0], pair[1]]),
                })
                .collect(),
        };

        if self.horizontal_predictor {
            for row in values.chunks_exact_mut(row_len) {
                undo_horizontal_differencing(row, spp, self.bits);
            }
        }

        Ok((values, rows))
    }
}

/// Reverses horizontal differencing on one row of samples
fn undo_horizontal_differencing(row: &mut [u16], spp: usize, bits: u16) {
    for i in spp..row.len() {
        row[i] = if bits == 8 {
            (row[i] as u8).wrapping_add(row[i - spp] as u8) as u16
        } else {
            row[i].wrapping_add(row[i - spp])
        };
    }
}
