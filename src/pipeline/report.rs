//! Per-point outcomes and the run report

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::ScoutResult;
use crate::features::{FeatureVector, FEATURE_NAMES};

use super::point::PointOfInterest;

/// What happened to one point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointOutcome {
    /// A scene was selected, cropped and saved
    Fetched {
        scene_id: String,
        platform: String,
        acquired: NaiveDate,
        artifact: PathBuf,
    },
    /// The artifact was already on disk
    Cached { artifact: PathBuf },
    /// No catalog item contains the point in the date window
    NoScene,
    Failed { reason: String },
}

impl PointOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, PointOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            PointOutcome::Fetched { .. } => "fetched",
            PointOutcome::Cached { .. } => "cached",
            PointOutcome::NoScene => "no_scene",
            PointOutcome::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PointResult {
    pub point: PointOfInterest,
    pub outcome: PointOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
}

const POINT_COLUMNS: [&str; 4] = ["uid", "region", "latitude", "longitude"];

/// One row of the features table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub uid: u64,
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mean_r: f64,
    pub mean_g: f64,
    pub mean_b: f64,
    pub median_r: f64,
    pub median_g: f64,
    pub median_b: f64,
}

impl FeatureRow {
    pub fn new(point: &PointOfInterest, features: &FeatureVector) -> Self {
        let [mean_r, mean_g, mean_b, median_r, median_g, median_b] = features.0;
        FeatureRow {
            uid: point.uid,
            region: point.region.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            mean_r,
            mean_g,
            mean_b,
            median_r,
            median_g,
            median_b,
        }
    }
}

/// Results of a pipeline run, in point order
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub results: Vec<PointResult>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: PointResult) {
        self.results.push(result);
    }

    /// Uids of the points that failed
    pub fn errored(&self) -> Vec<u64> {
        self.results.iter()
            .filter(|r| r.outcome.is_failure())
            .map(|r| r.point.uid)
            .collect()
    }

    /// Number of points with the given outcome label
    pub fn count(&self, label: &str) -> usize {
        self.results.iter().filter(|r| r.outcome.label() == label).count()
    }

    pub fn summary(&self) -> String {
        format!("{} points: {} fetched, {} cached, {} without scene, {} failed",
                self.results.len(), self.count("fetched"), self.count("cached"),
                self.count("no_scene"), self.count("failed"))
    }

    /// Writes the report as pretty-printed JSON
    pub fn write_json(&self, path: &Path) -> ScoutResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        info!("Wrote run report to {}", path.display());
        Ok(())
    }

    /// Rows of the points that have features
    pub fn feature_rows(&self) -> Vec<FeatureRow> {
        self.results.iter()
            .filter_map(|r| r.features.as_ref().map(|f| FeatureRow::new(&r.point, f)))
            .collect()
    }

    /// Writes one CSV row per point that has features
    ///
    /// The header is written even when no point has features.
    pub fn write_features_csv<W: Write>(&self, writer: W) -> ScoutResult<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(POINT_COLUMNS.iter().chain(FEATURE_NAMES.iter()))?;
        for row in self.feature_rows() {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn save_features_csv(&self, path: &Path) -> ScoutResult<()> {
        self.write_features_csv(File::create(path)?)?;
        info!("Wrote features to {}", path.display());
        Ok(())
    }
}
