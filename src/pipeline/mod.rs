//! The per-point fetch pipeline
//!
//! For each point: reuse the saved artifact if there is one, otherwise
//! search the catalog around the point, select a scene, crop it to the
//! feature box and save it. Points are processed one after the other and a
//! failing point never stops the run.

mod point;
mod report;

pub use point::PointOfInterest;
pub use report::{FeatureRow, PointOutcome, PointResult, RunReport};

use log::{debug, info, warn};

use crate::catalog::{Catalog, DateRange, SearchQuery};
use crate::coordinate::BoundingBox;
use crate::errors::ScoutResult;
use crate::features::extract_features;
use crate::imagery::{ImageArray, SceneCropper};
use crate::scene::select_best_item;
use crate::store::ArrayStore;
use crate::utils::progress::ProgressTracker;

/// Collections searched when none are configured
pub const DEFAULT_COLLECTIONS: [&str; 2] = ["sentinel-2-l2a", "landsat-c2-l2"];

/// Search and crop parameters shared by all points
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub collections: Vec<String>,
    /// Half-width of the catalog search box in meters
    pub search_buffer_meters: f64,
    /// Half-width of the cropped area in meters
    pub feature_buffer_meters: f64,
    /// Days before the sample date included in the search
    pub days_before: i64,
    pub page_size: u32,
    pub compute_features: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings {
            collections: DEFAULT_COLLECTIONS.iter().map(|c| c.to_string()).collect(),
            search_buffer_meters: 50_000.0,
            feature_buffer_meters: 500.0,
            days_before: 30,
            page_size: 100,
            compute_features: false,
        }
    }
}

pub struct Pipeline<'a> {
    catalog: &'a dyn Catalog,
    cropper: &'a dyn SceneCropper,
    store: &'a ArrayStore,
    settings: PipelineSettings,
    show_progress: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(catalog: &'a dyn Catalog, cropper: &'a dyn SceneCropper, store: &'a ArrayStore, settings: PipelineSettings) -> Self {
        Pipeline {
            catalog,
            cropper,
            store,
            settings,
            show_progress: false,
        }
    }

    /// Draw a progress bar while running
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Catalog query for a point
    pub fn query_for(&self, point: &PointOfInterest) -> SearchQuery {
        SearchQuery {
            collections: self.settings.collections.clone(),
            bbox: BoundingBox::around(point.latitude, point.longitude, self.settings.search_buffer_meters),
            datetime: DateRange::ending_on(point.date, self.settings.days_before),
            limit: self.settings.page_size,
        }
    }

    /// Processes every point in order
    pub fn run(&self, points: &[PointOfInterest]) -> RunReport {
        let progress = if self.show_progress {
            ProgressTracker::new(points.len() as u64, "Fetching scenes")
        } else {
            ProgressTracker::hidden()
        };

        let mut report = RunReport::new();
        for point in points {
            progress.set_message(&format!("point {}", point.uid));
            report.push(self.run_point(point));
            progress.increment(1);
        }
        progress.finish();

        info!("{}", report.summary());
        let errored = report.errored();
        if !errored.is_empty() {
            warn!("Failed points: {:?}", errored);
        }

        report
    }

    /// Processes one point, turning any error into a `Failed` outcome
    pub fn run_point(&self, point: &PointOfInterest) -> PointResult {
        match self.process(point) {
            Ok((outcome, image)) => {
                let features = match (&image, self.settings.compute_features) {
                    (Some(image), true) => Some(extract_features(image)),
                    _ => None,
                };
                if let Some(features) = &features {
                    debug!("Point {} features: {}", point.uid, features);
                }
                PointResult { point: point.clone(), outcome, features }
            },
            Err(e) => {
                warn!("Point {} ({}, {}) failed: {}", point.uid, point.latitude, point.longitude, e);
                PointResult {
                    point: point.clone(),
                    outcome: PointOutcome::Failed { reason: e.to_string() },
                    features: None,
                }
            }
        }
    }

    fn process(&self, point: &PointOfInterest) -> ScoutResult<(PointOutcome, Option<ImageArray>)> {
        if self.store.exists(point) {
            let artifact = self.store.path_for(point);
            debug!("Point {} cached at {}", point.uid, artifact.display());
            let image = self.store.load(point)?;
            return Ok((PointOutcome::Cached { artifact }, Some(image)));
        }

        let query = self.query_for(point);
        debug!("Point {}: searching {:?} during {}", point.uid, query.bbox.to_array(), query.datetime);
        let items = self.catalog.search(&query)?;

        let choice = match select_best_item(&items, point.date, &point.location()) {
            Some(choice) => choice,
            None => {
                info!("Point {}: no scene among {} items", point.uid, items.len());
                return Ok((PointOutcome::NoScene, None));
            }
        };

        info!("Point {}: selected {} ({}, {})", point.uid, choice.item.id, choice.platform, choice.date);

        let feature_box = BoundingBox::around(point.latitude, point.longitude, self.settings.feature_buffer_meters);
        let image = self.cropper.crop(&choice, &feature_box)?;
        let artifact = self.store.save(point, &image)?;

        let outcome = PointOutcome::Fetched {
            scene_id: choice.item.id.clone(),
            platform: choice.platform.clone(),
            acquired: choice.date,
            artifact,
        };
        Ok((outcome, Some(image)))
    }
}
