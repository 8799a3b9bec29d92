use std::path::PathBuf;

use log::info;
use reqwest::blocking::Client;

use crate::catalog::{AssetSigner, Catalog, CatalogItem, NoopSigner, PlanetaryComputerSigner, StacClient};
use crate::config::{ScoutConfig, SigningMode};
use crate::errors::ScoutResult;
use crate::imagery::CogCropper;
use crate::pipeline::{Pipeline, PointOfInterest, RunReport};
use crate::scene::{select_best_item, SceneChoice};
use crate::store::ArrayStore;

/// Report file written next to the artifacts
pub const REPORT_FILE: &str = "report.json";
/// Feature table written when features are enabled
pub const FEATURES_FILE: &str = "features.csv";

/// Main interface to the pondscout library
///
/// Wires the STAC client, asset signing, COG cropping and the artifact
/// store together from one configuration.
pub struct PondScout {
    config: ScoutConfig,
    catalog: StacClient,
    cropper: CogCropper,
    store: ArrayStore,
}

impl PondScout {
    /// Builds the remote clients described by a configuration
    pub fn new(config: ScoutConfig) -> ScoutResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("pondscout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let signer: Box<dyn AssetSigner> = match config.catalog.signing {
            SigningMode::PlanetaryComputer => {
                Box::new(PlanetaryComputerSigner::new(client.clone(), &config.catalog.token_url))
            },
            SigningMode::None => Box::new(NoopSigner),
        };

        let catalog = StacClient::new(client.clone(), &config.catalog.url);
        let cropper = CogCropper::new(client, signer);
        let store = config.store();

        Ok(PondScout { config, catalog, cropper, store })
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Runs the pipeline over the configured points
    ///
    /// Writes `report.json`, and `features.csv` when features are enabled,
    /// into the output directory.
    pub fn run(&self, show_progress: bool) -> ScoutResult<RunReport> {
        let points = self.config.points();
        info!("Processing {} points into {}", points.len(), self.store.dir().display());

        let pipeline = Pipeline::new(&self.catalog, &self.cropper, &self.store, self.config.pipeline_settings())
            .with_progress(show_progress);
        let report = pipeline.run(&points);

        report.write_json(&self.report_path())?;
        if self.config.output.compute_features {
            report.save_features_csv(&self.store.dir().join(FEATURES_FILE))?;
        }

        Ok(report)
    }

    /// Candidate items for a point and the scene that would be selected
    pub fn search(&self, point: &PointOfInterest) -> ScoutResult<(Vec<CatalogItem>, Option<SceneChoice>)> {
        let pipeline = Pipeline::new(&self.catalog, &self.cropper, &self.store, self.config.pipeline_settings());
        let items = self.catalog.search(&pipeline.query_for(point))?;
        let choice = select_best_item(&items, point.date, &point.location());
        Ok((items, choice))
    }

    pub fn report_path(&self) -> PathBuf {
        self.store.dir().join(REPORT_FILE)
    }
}
