//! Prints feature vectors of persisted arrays as CSV

use std::path::PathBuf;

use clap::ArgMatches;
use log::warn;
use serde::Serialize;

use crate::commands::command_traits::Command;
use crate::errors::{ScoutError, ScoutResult};
use crate::features::{extract_features, FeatureVector};
use crate::store::load_array;
use crate::utils::logger::Logger;

#[derive(Serialize)]
struct FileFeatures {
    file: String,
    mean_r: f64,
    mean_g: f64,
    mean_b: f64,
    median_r: f64,
    median_g: f64,
    median_b: f64,
}

impl FileFeatures {
    fn new(file: String, features: &FeatureVector) -> Self {
        let [mean_r, mean_g, mean_b, median_r, median_g, median_b] = features.0;
        FileFeatures { file, mean_r, mean_g, mean_b, median_r, median_g, median_b }
    }
}

pub struct FeaturesCommand<'a> {
    files: Vec<PathBuf>,
    logger: &'a Logger,
}

impl<'a> FeaturesCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> ScoutResult<Self> {
        let files: Vec<PathBuf> = args.get_many::<String>("files")
            .map(|values| values.map(PathBuf::from).collect())
            .unwrap_or_default();

        if files.is_empty() {
            return Err(ScoutError::GenericError("No array files given".to_string()));
        }

        Ok(FeaturesCommand { files, logger })
    }
}

impl<'a> Command for FeaturesCommand<'a> {
    fn execute(&self) -> ScoutResult<()> {
        let mut csv_writer = csv::Writer::from_writer(std::io::stdout());

        let mut failed = 0;
        for path in &self.files {
            match load_array(path) {
                Ok(image) => {
                    let features = extract_features(&image);
                    csv_writer.serialize(FileFeatures::new(path.display().to_string(), &features))?;
                },
                Err(e) => {
                    warn!("Skipping {}: {}", path.display(), e);
                    failed += 1;
                }
            }
        }

        csv_writer.flush()?;

        self.logger.log(&format!("features: {} files, {} unreadable", self.files.len(), failed))?;
        if failed == self.files.len() {
            return Err(ScoutError::ArrayFormatError("None of the files could be read".to_string()));
        }
        Ok(())
    }
}
