//! Run configuration loaded from a TOML file
//!
//! Every section is optional; omitted values fall back to the defaults of
//! the Planetary Computer setup. Points without a `uid` are numbered by
//! their position in the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use log::debug;
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::catalog::PLANETARY_COMPUTER_TOKEN_URL;
use crate::errors::{ScoutError, ScoutResult};
use crate::pipeline::{PipelineSettings, PointOfInterest, DEFAULT_COLLECTIONS};
use crate::store::{ArrayFormat, ArrayStore, ArtifactNaming};

pub const DEFAULT_CATALOG_URL: &str = "https://planetarycomputer.microsoft.com/api/stac/v1";

/// How asset URLs are made fetchable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningMode {
    None,
    PlanetaryComputer,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSection {
    pub url: String,
    pub collections: Vec<String>,
    pub signing: SigningMode,
    pub token_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        CatalogSection {
            url: DEFAULT_CATALOG_URL.to_string(),
            collections: DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            signing: SigningMode::PlanetaryComputer,
            token_url: PLANETARY_COMPUTER_TOKEN_URL.to_string(),
            page_size: 100,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSection {
    pub buffer_meters: f64,
    pub feature_buffer_meters: f64,
    pub days_before: i64,
}

impl Default for SearchSection {
    fn default() -> Self {
        SearchSection {
            buffer_meters: 50_000.0,
            feature_buffer_meters: 500.0,
            days_before: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSection {
    pub dir: PathBuf,
    pub format: ArrayFormat,
    pub naming: ArtifactNaming,
    pub compute_features: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        OutputSection {
            dir: PathBuf::from("data/image_arrays"),
            format: ArrayFormat::Npy,
            naming: ArtifactNaming::Uid,
            compute_features: false,
        }
    }
}

/// A point as written in the file
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointEntry {
    #[serde(default)]
    pub uid: Option<u64>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub region: String,
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
}

/// Accepts both TOML dates (`2022-08-31`) and strings (`"2022-08-31"`)
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => s,
        toml::Value::Datetime(dt) => dt.to_string(),
        other => return Err(de::Error::custom(format!("expected a date, found {}", other.type_str()))),
    };

    NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(de::Error::custom)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoutConfig {
    pub catalog: CatalogSection,
    pub search: SearchSection,
    pub output: OutputSection,
    pub points: Vec<PointEntry>,
}

impl ScoutConfig {
    /// Reads and validates a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> ScoutResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ScoutError::ConfigError(
            format!("Cannot read {}: {}", path.display(), e)))?;
        let config = Self::parse(&content)?;
        debug!("Loaded {} points from {}", config.points.len(), path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> ScoutResult<Self> {
        let config: ScoutConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ScoutResult<()> {
        if self.catalog.collections.is_empty() {
            return Err(ScoutError::ConfigError("catalog.collections is empty".to_string()));
        }
        if self.catalog.page_size == 0 {
            return Err(ScoutError::ConfigError("catalog.page_size must be positive".to_string()));
        }
        if self.search.buffer_meters <= 0.0 || self.search.feature_buffer_meters <= 0.0 {
            return Err(ScoutError::ConfigError("Buffers must be positive".to_string()));
        }
        if self.search.days_before < 0 {
            return Err(ScoutError::ConfigError("search.days_before must not be negative".to_string()));
        }

        for (i, p) in self.points.iter().enumerate() {
            if !(-90.0..=90.0).contains(&p.latitude) || !(-180.0..=180.0).contains(&p.longitude) {
                return Err(ScoutError::ConfigError(format!(
                    "Point {} has invalid coordinates ({}, {})", i, p.latitude, p.longitude)));
            }
        }

        let mut uids: Vec<u64> = self.points().iter().map(|p| p.uid).collect();
        uids.sort_unstable();
        if let Some(w) = uids.windows(2).find(|w| w[0] == w[1]) {
            return Err(ScoutError::ConfigError(format!("Duplicate point uid {}", w[0])));
        }

        Ok(())
    }

    /// Configured points, with positional uids filled in
    pub fn points(&self) -> Vec<PointOfInterest> {
        self.points.iter()
            .enumerate()
            .map(|(i, p)| PointOfInterest::new(
                p.uid.unwrap_or(i as u64), p.latitude, p.longitude, &p.region, p.date))
            .collect()
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            collections: self.catalog.collections.clone(),
            search_buffer_meters: self.search.buffer_meters,
            feature_buffer_meters: self.search.feature_buffer_meters,
            days_before: self.search.days_before,
            page_size: self.catalog.page_size,
            compute_features: self.output.compute_features,
        }
    }

    pub fn store(&self) -> ArrayStore {
        ArrayStore::new(&self.output.dir, self.output.format, self.output.naming)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.catalog.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = ScoutConfig::parse("").unwrap();
        assert_eq!(config.catalog.url, DEFAULT_CATALOG_URL);
        assert_eq!(config.catalog.collections, vec!["sentinel-2-l2a", "landsat-c2-l2"]);
        assert_eq!(config.catalog.signing, SigningMode::PlanetaryComputer);
        assert_eq!(config.search.buffer_meters, 50_000.0);
        assert_eq!(config.search.feature_buffer_meters, 500.0);
        assert_eq!(config.search.days_before, 30);
        assert_eq!(config.output.dir, PathBuf::from("data/image_arrays"));
        assert_eq!(config.output.format, ArrayFormat::Npy);
        assert!(config.points().is_empty());
    }

    #[test]
    fn points_get_positional_uids() {
        let config = ScoutConfig::parse(r#"
            [output]
            format = "jpg"
            naming = "descriptive"

            [[points]]
            latitude = -7.675039
            longitude = 107.769191
            region = "jawa"
            date = 2022-08-31

            [[points]]
            uid = 17
            latitude = -5.552498
            longitude = 120.375194
            region = "sulawesi"
            date = "2022-08-31"

            [[points]]
            latitude = -5.559804
            longitude = 120.376871
            date = 2022-08-30
        "#).unwrap();

        let points = config.points();
        assert_eq!(points.iter().map(|p| p.uid).collect::<Vec<_>>(), vec![0, 17, 2]);
        assert_eq!(points[0].region, "jawa");
        assert_eq!(points[2].date, NaiveDate::from_ymd_opt(2022, 8, 30).unwrap());
        assert_eq!(config.output.format, ArrayFormat::Jpg);
        assert_eq!(config.output.naming, ArtifactNaming::Descriptive);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ScoutConfig::parse("[search]\nbuffer_meters = 0").is_err());
        assert!(ScoutConfig::parse("[catalog]\ncollections = []").is_err());
        assert!(ScoutConfig::parse("[output]\nformat = \"tiff\"").is_err());
        assert!(ScoutConfig::parse("[output]\nunknown = 1").is_err());
        assert!(ScoutConfig::parse(r#"
            [[points]]
            uid = 1
            latitude = 0.5
            longitude = 0.5
            date = 2022-08-31
            [[points]]
            latitude = 0.5
            longitude = 0.5
            date = 2022-08-31
        "#).is_err());
        assert!(ScoutConfig::parse(r#"
            [[points]]
            latitude = 95.0
            longitude = 0.5
            date = 2022-08-31
        "#).is_err());
    }

    #[test]
    fn settings_follow_sections() {
        let config = ScoutConfig::parse("[search]\ndays_before = 15\n[output]\ncompute_features = true").unwrap();
        let settings = config.pipeline_settings();
        assert_eq!(settings.days_before, 15);
        assert!(settings.compute_features);
        assert_eq!(config.timeout(), Duration::from_secs(60));
    }
}
