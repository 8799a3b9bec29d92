pub mod errors;
pub mod io;
pub mod tiff;
pub mod utils;
pub mod compression;
pub mod extractor;
pub mod coordinate;
pub mod catalog;
pub mod scene;
pub mod imagery;
pub mod store;
pub mod features;
pub mod pipeline;
pub mod config;
pub mod commands;
pub mod api;

pub use crate::api::PondScout;
pub use crate::errors::{ScoutError, ScoutResult};

pub use catalog::{Catalog, CatalogItem, SearchQuery, StacClient};
pub use config::ScoutConfig;
pub use coordinate::{BoundingBox, Point, CoordinateTransformer, CoordinateSystem};
pub use extractor::{GeoTiffExtractor, Region};
pub use features::{extract_features, FeatureVector};
pub use imagery::{ImageArray, SceneCropper};
pub use pipeline::{Pipeline, PipelineSettings, PointOfInterest, PointOutcome, RunReport};
pub use scene::{select_best_item, PlatformFamily, SceneChoice};
pub use store::{ArrayFormat, ArrayStore, ArtifactNaming};
pub use tiff::TiffReader;
