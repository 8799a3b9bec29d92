//! Read-only view of STAC items

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::coordinate::BoundingBox;
use crate::tiff::constants::epsg;

/// One downloadable file of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// URL of the file
    pub href: String,
    /// Media type, e.g. `image/tiff; application=geotiff; profile=cloud-optimized`
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemProperties {
    #[serde(default)]
    pub datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(rename = "eo:cloud_cover", default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
}

/// A STAC item as returned by a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub bbox: Vec<f64>,
    #[serde(default)]
    pub properties: ItemProperties,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
}

impl CatalogItem {
    /// Footprint bounds; 3D boxes drop their elevation
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self.bbox.as_slice() {
            [min_x, min_y, max_x, max_y] => {
                Some(BoundingBox::new_with_crs(*min_x, *min_y, *max_x, *max_y, epsg::WGS84))
            },
            [min_x, min_y, _, max_x, max_y, _] => {
                Some(BoundingBox::new_with_crs(*min_x, *min_y, *max_x, *max_y, epsg::WGS84))
            },
            _ => None,
        }
    }

    /// Acquisition instant, falling back to the start of the acquisition interval
    pub fn acquired(&self) -> Option<DateTime<Utc>> {
        self.properties.datetime.or(self.properties.start_datetime)
    }

    /// Calendar day of acquisition
    pub fn acquisition_date(&self) -> Option<NaiveDate> {
        self.acquired().map(|dt| dt.date_naive())
    }

    /// Platform name, empty when the catalog does not report one
    pub fn platform(&self) -> &str {
        self.properties.platform.as_deref().unwrap_or("")
    }

    /// Collection id, empty when absent
    pub fn collection_id(&self) -> &str {
        self.collection.as_deref().unwrap_or("")
    }

    /// Looks up an asset by key
    pub fn asset(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTINEL_ITEM: &str = r#"{
        "type": "Feature",
        "stac_version": "1.0.0",
        "id": "S2A_MSIL2A_20220828T024551_R132_T48MZT",
        "collection": "sentinel-2-l2a",
        "bbox": [107.1, -8.2, 108.1, -7.2],
        "properties": {
            "datetime": "2022-08-28T02:45:51.024000Z",
            "platform": "Sentinel-2A",
            "eo:cloud_cover": 12.5
        },
        "assets": {
            "visual": {
                "href": "https://sentinel2l2a01.blob.core.windows.net/sentinel2-l2/48/M/ZT/TCI.tif",
                "type": "image/tiff; application=geotiff; profile=cloud-optimized"
            }
        },
        "links": []
    }"#;

    #[test]
    fn parses_stac_feature() {
        let item: CatalogItem = serde_json::from_str(SENTINEL_ITEM).unwrap();

        assert_eq!(item.platform(), "Sentinel-2A");
        assert_eq!(item.collection_id(), "sentinel-2-l2a");
        assert_eq!(item.acquisition_date(), NaiveDate::from_ymd_opt(2022, 8, 28));
        assert_eq!(item.properties.cloud_cover, Some(12.5));
        assert!(item.asset("visual").unwrap().href.ends_with("TCI.tif"));

        let bbox = item.bounding_box().unwrap();
        assert_eq!(bbox.to_array(), [107.1, -8.2, 108.1, -7.2]);
    }

    #[test]
    fn interval_items_use_start_datetime() {
        let json = r#"{"id": "x", "bbox": [0, 0, 0, 1, 1, 0],
            "properties": {"datetime": null, "start_datetime": "2022-08-10T00:00:00Z"}}"#;
        let item: CatalogItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.acquisition_date(), NaiveDate::from_ymd_opt(2022, 8, 10));
        assert_eq!(item.bounding_box().unwrap().to_array(), [0.0, 0.0, 1.0, 1.0]);
        assert_eq!(item.platform(), "");
    }
}
