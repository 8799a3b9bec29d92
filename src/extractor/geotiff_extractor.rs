//! Georeferenced window extraction from a GeoTIFF
//!
//! Facade over the TIFF reader, the GeoKey parser and the strip/tile
//! readers: open a source once, then cut pixel windows out of its
//! full-resolution image.

use log::{debug, info};
use ndarray::Array3;

use crate::coordinate::BoundingBox;
use crate::errors::{ScoutError, ScoutResult};
use crate::io::seekable::SeekableReader;
use crate::tiff::geo_key_parser::{GeoInfo, GeoKeyParser};
use crate::tiff::reader::TiffReader;
use crate::tiff::types::TIFF;

use super::region::Region;
use super::sample_layout::SampleLayout;
use super::strip_reader::StripReader;
use super::tile_reader::TileReader;
use super::WindowReader;

/// An opened GeoTIFF ready for window reads
pub struct GeoTiffExtractor<R: SeekableReader> {
    reader: R,
    tiff_reader: TiffReader,
    tiff: TIFF,
    geo: GeoInfo,
    layout: SampleLayout,
}

impl<R: SeekableReader> GeoTiffExtractor<R> {
    /// Reads the header, IFDs and georeferencing of a source
    pub fn open(mut reader: R) -> ScoutResult<Self> {
        let mut tiff_reader = TiffReader::new();
        let tiff = tiff_reader.read(&mut reader)?;

        let ifd = tiff.main_ifd().ok_or(ScoutError::InvalidHeader)?;
        let geo = GeoKeyParser::extract_geo_info(&mut reader, &tiff_reader, ifd)?;
        let layout = SampleLayout::from_ifd(&mut reader, &tiff_reader, ifd)?;

        debug!("{}", tiff);
        info!("Opened {}x{} GeoTIFF in EPSG:{} ({} overviews)",
              layout.width, layout.height, geo.epsg_code, tiff.overviews().len());

        Ok(GeoTiffExtractor {
            reader,
            tiff_reader,
            tiff,
            geo,
            layout,
        })
    }

    /// Georeferencing of the full-resolution image
    pub fn geo_info(&self) -> &GeoInfo {
        &self.geo
    }

    /// Width and height of the full-resolution image
    pub fn dimensions(&self) -> (u32, u32) {
        (self.layout.width, self.layout.height)
    }

    /// Samples per pixel
    pub fn samples(&self) -> usize {
        self.layout.samples
    }

    /// Gives back the underlying source
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Reads a pixel region as `(sample, row, column)`
    pub fn extract(&mut self, region: Region) -> ScoutResult<Array3<u16>> {
        let ifd = self.tiff.main_ifd().ok_or(ScoutError::InvalidHeader)?;

        let window_reader: Box<dyn WindowReader + '_> = if ifd.is_tiled() {
            Box::new(TileReader::new(ifd, &self.tiff_reader))
        } else {
            Box::new(StripReader::new(ifd, &self.tiff_reader))
        };

        window_reader.read_window(&mut self.reader, &self.layout, region)
    }

    /// Reads the window covering a box given in the raster's own CRS
    pub fn extract_bbox(&mut self, bbox: &BoundingBox) -> ScoutResult<Array3<u16>> {
        let (width, height) = self.dimensions();
        let region = bbox.to_pixel_region(&self.geo.transform, width, height)?;
        debug!("Box {:?} maps to pixel window {:?}", bbox, region);
        self.extract(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::tiff::tests::test_utils::GeoTiffFixture;

    fn assert_window(fixture: &GeoTiffFixture, window: &Array3<u16>, region: Region) {
        let (bands, rows, cols) = window.dim();
        assert_eq!((rows, cols), (region.height as usize, region.width as usize));
        for s in 0..bands {
            for r in 0..rows {
                for c in 0..cols {
                    let expected = fixture.sample(region.x + c as u32, region.y + r as u32, s as u16);
                    assert_eq!(window[[s, r, c]], expected, "band {} row {} col {}", s, r, c);
                }
            }
        }
    }

    #[test]
    fn reads_uncompressed_stripped_chunky_window() {
        let fixture = GeoTiffFixture::new(8, 7, 3);
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let region = Region::new(2, 1, 4, 5);
        let window = extractor.extract(region).unwrap();
        assert_eq!(window.dim().0, 3);
        assert_window(&fixture, &window, region);
    }

    #[test]
    fn reads_deflate_tiled_predictor_16_bit_window() {
        let fixture = GeoTiffFixture::new(10, 9, 3).bits16().deflate().with_predictor().tiled(4, 4);
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let region = Region::new(3, 2, 6, 7);
        let window = extractor.extract(region).unwrap();
        assert_window(&fixture, &window, region);
    }

    #[test]
    fn reads_planar_big_endian_zstd_window() {
        let fixture = GeoTiffFixture::new(6, 6, 3).big_endian().bits16().zstd().planar().tiled(4, 4);
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let region = Region::new(0, 0, 6, 6);
        let window = extractor.extract(region).unwrap();
        assert_window(&fixture, &window, region);
    }

    #[test]
    fn single_band_raster_reads_one_channel() {
        let fixture = GeoTiffFixture::new(5, 5, 1).deflate();
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let window = extractor.extract(Region::new(1, 1, 3, 3)).unwrap();
        assert_eq!(window.dim(), (1, 3, 3));
        assert_window(&fixture, &window, Region::new(1, 1, 3, 3));
    }

    #[test]
    fn bbox_window_follows_geotransform() {
        // 10 m pixels with the top-left corner at (700000, 9150000)
        let fixture = GeoTiffFixture::new(10, 10, 3);
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let bbox = BoundingBox::new(700020.0, 9149930.0, 700055.0, 9149975.0);
        let window = extractor.extract_bbox(&bbox).unwrap();

        // columns floor(2.0)..ceil(5.5) and rows floor(2.5)..ceil(7.0)
        assert_window(&fixture, &window, Region::new(2, 2, 4, 5));
    }

    #[test]
    fn bbox_outside_raster_is_an_error() {
        let fixture = GeoTiffFixture::new(4, 4, 3);
        let mut extractor = GeoTiffExtractor::open(Cursor::new(fixture.build())).unwrap();

        let bbox = BoundingBox::new(800000.0, 9000000.0, 800100.0, 9000100.0);
        assert!(extractor.extract_bbox(&bbox).is_err());
    }
}
