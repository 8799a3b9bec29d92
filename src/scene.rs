//! Best-scene selection
//!
//! Picks one catalog item per point: it must contain the point, Sentinel
//! scenes beat everything else, and within the remaining family the scene
//! acquired closest to the sample date wins.

use std::fmt;

use chrono::NaiveDate;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::catalog::CatalogItem;
use crate::coordinate::Point;

lazy_static! {
    static ref SENTINEL_PLATFORM: Regex = Regex::new(r"(?i)sentinel").unwrap();
}

/// Sensor family of a scene, which decides how it is cropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    /// Sentinel-2: 10 m true-colour `visual` asset
    Sentinel,
    /// Landsat and anything else: separate red/green/blue band assets
    Landsat,
}

impl PlatformFamily {
    pub fn from_platform(platform: &str) -> Self {
        if SENTINEL_PLATFORM.is_match(platform) {
            PlatformFamily::Sentinel
        } else {
            PlatformFamily::Landsat
        }
    }

    /// Family of an item, judged by platform name and then collection id
    pub fn of_item(item: &CatalogItem) -> Self {
        match PlatformFamily::from_platform(item.platform()) {
            PlatformFamily::Sentinel => PlatformFamily::Sentinel,
            PlatformFamily::Landsat => PlatformFamily::from_platform(item.collection_id()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PlatformFamily::Sentinel => "sentinel",
            PlatformFamily::Landsat => "landsat",
        }
    }
}

impl fmt::Display for PlatformFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The selected scene for one point
#[derive(Debug, Clone, PartialEq)]
pub struct SceneChoice {
    pub item: CatalogItem,
    /// Platform name as reported by the catalog
    pub platform: String,
    pub family: PlatformFamily,
    /// Acquisition day
    pub date: NaiveDate,
}

/// Selects the best item for `point` around `target`
///
/// Returns `None` when no dated item strictly contains the point.
pub fn select_best_item(items: &[CatalogItem], target: NaiveDate, point: &Point) -> Option<SceneChoice> {
    let containing: Vec<(&CatalogItem, NaiveDate)> = items.iter()
        .filter(|item| item.bounding_box().map(|b| b.contains(point)).unwrap_or(false))
        .filter_map(|item| item.acquisition_date().map(|date| (item, date)))
        .collect();

    debug!("{} of {} items contain ({}, {})", containing.len(), items.len(), point.lat(), point.lon());

    let has_sentinel = containing.iter()
        .any(|(item, _)| PlatformFamily::of_item(item) == PlatformFamily::Sentinel);

    // min_by_key keeps the first of equal keys
    let (item, date) = containing.into_iter()
        .filter(|(item, _)| !has_sentinel || PlatformFamily::of_item(item) == PlatformFamily::Sentinel)
        .min_by_key(|(_, date)| (*date - target).num_days().abs())?;

    Some(SceneChoice {
        item: item.clone(),
        platform: item.platform().to_string(),
        family: PlatformFamily::of_item(item),
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemProperties;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn item(id: &str, platform: &str, bbox: [f64; 4], day: u32) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            collection: None,
            bbox: bbox.to_vec(),
            properties: ItemProperties {
                datetime: Some(Utc.with_ymd_and_hms(2022, 8, day, 3, 0, 0).unwrap()),
                platform: Some(platform.to_string()),
                ..Default::default()
            },
            assets: BTreeMap::new(),
        }
    }

    fn target() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 8, 31).unwrap()
    }

    const AROUND: [f64; 4] = [107.0, -8.0, 108.0, -7.0];

    #[test]
    fn sentinel_wins_regardless_of_date() {
        let items = vec![
            item("landsat-close", "landsat-9", AROUND, 30),
            item("sentinel-far", "Sentinel-2B", AROUND, 2),
        ];
        let point = Point::from_lat_lon(-7.675039, 107.769191);

        let choice = select_best_item(&items, target(), &point).unwrap();
        assert_eq!(choice.item.id, "sentinel-far");
        assert_eq!(choice.family, PlatformFamily::Sentinel);
        assert_eq!(choice.platform, "Sentinel-2B");
        assert_eq!(choice.date, NaiveDate::from_ymd_opt(2022, 8, 2).unwrap());
    }

    #[test]
    fn closest_date_wins_within_family() {
        let items = vec![
            item("a", "landsat-8", AROUND, 5),
            item("b", "landsat-9", AROUND, 29),
            item("c", "landsat-8", AROUND, 21),
        ];
        let point = Point::from_lat_lon(-7.5, 107.5);

        assert_eq!(select_best_item(&items, target(), &point).unwrap().item.id, "b");
    }

    #[test]
    fn ties_keep_catalog_order() {
        let items = vec![
            item("first", "landsat-8", AROUND, 29),
            item("second", "landsat-9", AROUND, 29),
        ];
        let point = Point::from_lat_lon(-7.5, 107.5);

        assert_eq!(select_best_item(&items, target(), &point).unwrap().item.id, "first");
    }

    #[test]
    fn containment_is_strict() {
        let items = vec![
            item("edge", "Sentinel-2A", [107.5, -8.0, 108.0, -7.0], 30),
            item("elsewhere", "landsat-8", [120.0, -6.0, 121.0, -5.0], 30),
        ];
        let point = Point::from_lat_lon(-7.5, 107.5);

        assert_eq!(select_best_item(&items, target(), &point), None);
        assert_eq!(select_best_item(&[], target(), &point), None);
    }

    #[test]
    fn family_matching_ignores_case() {
        assert_eq!(PlatformFamily::from_platform("SENTINEL-2A"), PlatformFamily::Sentinel);
        assert_eq!(PlatformFamily::from_platform("landsat-9"), PlatformFamily::Landsat);
        assert_eq!(PlatformFamily::from_platform(""), PlatformFamily::Landsat);
    }
}
