//! Crops Cloud-Optimized GeoTIFF assets to a feature box
//!
//! Sentinel scenes ship a ready-made true-colour `visual` asset; Landsat
//! scenes are assembled from their `red`, `green` and `blue` band assets.

use log::{debug, info};
use ndarray::{s, stack, Array3, Axis};
use reqwest::blocking::Client;

use crate::catalog::{AssetSigner, CatalogItem};
use crate::coordinate::{BoundingBox, CoordinateSystem, CoordinateSystemFactory, CoordinateTransformer};
use crate::errors::{ScoutError, ScoutResult};
use crate::extractor::GeoTiffExtractor;
use crate::io::http_range::HttpRangeReader;
use crate::io::seekable::SeekableReader;
use crate::scene::{PlatformFamily, SceneChoice};

use super::array::{ImageArray, CHANNELS};
use super::normalize::{min_max_to_u8, narrow_to_u8};
use super::SceneCropper;

/// Asset holding the Sentinel-2 true-colour composite
pub const VISUAL_ASSET: &str = "visual";

/// Landsat band assets, in channel order
pub const BAND_ASSETS: [&str; 3] = ["red", "green", "blue"];

/// Reads the window of `bbox` (EPSG:4326) out of one GeoTIFF source
pub fn crop_source<R: SeekableReader>(source: R, bbox: &BoundingBox) -> ScoutResult<Array3<u16>> {
    let mut extractor = GeoTiffExtractor::open(source)?;
    let raster_crs = CoordinateSystemFactory::from_epsg(extractor.geo_info().epsg_code);

    let native = CoordinateTransformer.transform_bbox(bbox, &CoordinateSystem::WGS84, &raster_crs)?;
    debug!("Feature box in {}: {:?}", raster_crs.description(), native.to_array());

    extractor.extract_bbox(&native)
}

/// Crops a visual composite, keeping its 8-bit values
pub fn crop_visual<R: SeekableReader>(source: R, bbox: &BoundingBox) -> ScoutResult<ImageArray> {
    let window = crop_source(source, bbox)?;
    let bands = window.len_of(Axis(0));
    if bands < CHANNELS {
        return Err(ScoutError::ArrayFormatError(format!(
            "Visual asset has {} bands, need {}", bands, CHANNELS)));
    }

    // Drop an alpha band if present
    let rgb = window.slice(s![0..CHANNELS, .., ..]).to_owned();
    ImageArray::new(narrow_to_u8(&rgb)?)
}

/// Crops three single-band sources, stacks them and min-max rescales to 8 bits
pub fn crop_bands<R: SeekableReader>(sources: Vec<R>, bbox: &BoundingBox) -> ScoutResult<ImageArray> {
    if sources.len() != CHANNELS {
        return Err(ScoutError::GenericError(format!(
            "Expected {} band sources, got {}", CHANNELS, sources.len())));
    }

    let mut bands = Vec::with_capacity(CHANNELS);
    for source in sources {
        let window = crop_source(source, bbox)?;
        bands.push(window.index_axis_move(Axis(0), 0));
    }

    let views: Vec<_> = bands.iter().map(|b| b.view()).collect();
    let stacked = stack(Axis(0), &views)
        .map_err(|e| ScoutError::ArrayFormatError(format!("Band windows differ in shape: {}", e)))?;

    ImageArray::new(min_max_to_u8(&stacked))
}

/// Crops remote scene assets over HTTP range requests
pub struct CogCropper {
    client: Client,
    signer: Box<dyn AssetSigner>,
}

impl CogCropper {
    pub fn new(client: Client, signer: Box<dyn AssetSigner>) -> Self {
        CogCropper { client, signer }
    }

    fn open_asset(&self, item: &CatalogItem, key: &str) -> ScoutResult<HttpRangeReader> {
        let asset = item.asset(key).ok_or_else(|| ScoutError::CatalogError(
            format!("Item {} has no '{}' asset", item.id, key)))?;

        let url = self.signer.sign(item.collection_id(), &asset.href)?;
        HttpRangeReader::open(self.client.clone(), &url)
    }
}

impl SceneCropper for CogCropper {
    fn crop(&self, choice: &SceneChoice, bbox: &BoundingBox) -> ScoutResult<ImageArray> {
        info!("Cropping {} scene {}", choice.family, choice.item.id);

        match choice.family {
            PlatformFamily::Sentinel => {
                let source = self.open_asset(&choice.item, VISUAL_ASSET)?;
                crop_visual(source, bbox)
            },
            PlatformFamily::Landsat => {
                let sources = BAND_ASSETS.iter()
                    .map(|key| self.open_asset(&choice.item, key))
                    .collect::<ScoutResult<Vec<_>>>()?;
                crop_bands(sources, bbox)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use crate::tiff::tests::test_utils::GeoTiffFixture;

    fn geographic(samples: u16) -> GeoTiffFixture {
        GeoTiffFixture::new(10, 10, samples)
            .epsg(4326)
            .origin(100.0, -5.0)
            .pixel_size(0.25)
    }

    #[test]
    fn visual_window_keeps_values() {
        let fixture = geographic(3).tiled(4, 4);
        let bbox = BoundingBox::new_with_crs(100.5, -6.0, 101.0, -5.5, 4326);

        let image = crop_visual(Cursor::new(fixture.build()), &bbox).unwrap();
        let view = image.view();
        assert_eq!(view.dim(), (3, 2, 2));
        for c in 0..3 {
            for r in 0..2 {
                for x in 0..2 {
                    assert_eq!(view[[c, r, x]] as u16, fixture.sample(2 + x as u32, 2 + r as u32, c as u16));
                }
            }
        }
    }

    #[test]
    fn visual_needs_three_bands() {
        let fixture = geographic(1);
        let bbox = BoundingBox::new_with_crs(100.5, -6.0, 101.0, -5.5, 4326);
        assert!(crop_visual(Cursor::new(fixture.build()), &bbox).is_err());
    }

    #[test]
    fn bands_are_stacked_and_rescaled() {
        let fixture = geographic(1).bits16().deflate();
        let sources = (0..3).map(|_| Cursor::new(fixture.build())).collect();
        let bbox = BoundingBox::new_with_crs(100.5, -6.0, 101.0, -5.5, 4326);

        let image = crop_bands(sources, &bbox).unwrap();
        let view = image.view();
        assert_eq!(view.dim(), (3, 2, 2));
        for c in 0..3 {
            assert_eq!(view[[c, 0, 0]], 0);
            assert_eq!(view[[c, 1, 1]], 255);
        }
    }

    #[test]
    fn utm_raster_is_cropped_from_geographic_box() {
        let fixture = GeoTiffFixture::new(10, 10, 3);
        let center = CoordinateTransformer.utm_to_wgs84(700050.0, 9149950.0, 48, false);
        let bbox = BoundingBox::around(center.lat(), center.lon(), 20.0);

        let image = crop_visual(Cursor::new(fixture.build()), &bbox).unwrap();
        assert!(image.height() >= 4 && image.height() <= 6, "height {}", image.height());
        assert!(image.width() >= 4 && image.width() <= 6, "width {}", image.width());
    }

    #[test]
    fn box_outside_raster_fails() {
        let fixture = geographic(3);
        let bbox = BoundingBox::new_with_crs(120.0, -6.0, 120.5, -5.5, 4326);
        assert!(matches!(crop_visual(Cursor::new(fixture.build()), &bbox), Err(ScoutError::ProjectionError(_))));
    }
}
