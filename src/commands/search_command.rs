//! Lists the catalog candidates for one point and the selected scene

use chrono::NaiveDate;
use clap::ArgMatches;
use serde::Serialize;

use crate::api::PondScout;
use crate::commands::command_traits::Command;
use crate::commands::parse_arg;
use crate::config::ScoutConfig;
use crate::errors::{ScoutError, ScoutResult};
use crate::pipeline::PointOfInterest;
use crate::scene::PlatformFamily;
use crate::utils::logger::Logger;

/// One catalog candidate as printed
#[derive(Serialize)]
struct CandidateRow<'r> {
    id: &'r str,
    collection: &'r str,
    platform: &'r str,
    date: String,
    family: String,
    contains_point: bool,
}

pub struct SearchCommand<'a> {
    config_path: Option<String>,
    point: PointOfInterest,
    logger: &'a Logger,
}

impl<'a> SearchCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> ScoutResult<Self> {
        let date_str = args.get_one::<String>("date")
            .ok_or_else(|| ScoutError::GenericError("Missing --date".to_string()))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .map_err(|e| ScoutError::GenericError(format!("Invalid --date {}: {}", date_str, e)))?;

        let point = PointOfInterest::new(0, parse_arg(args, "lat")?, parse_arg(args, "lon")?, "", date);

        Ok(SearchCommand {
            config_path: args.get_one::<String>("config").cloned(),
            point,
            logger,
        })
    }
}

impl<'a> Command for SearchCommand<'a> {
    fn execute(&self) -> ScoutResult<()> {
        let config = match &self.config_path {
            Some(path) => ScoutConfig::load(path)?,
            None => ScoutConfig::default(),
        };

        let scout = PondScout::new(config)?;
        let (items, choice) = scout.search(&self.point)?;

        let location = self.point.location();
        let mut csv_writer = csv::Writer::from_writer(std::io::stdout());
        for item in &items {
            csv_writer.serialize(CandidateRow {
                id: &item.id,
                collection: item.collection_id(),
                platform: item.platform(),
                date: item.acquisition_date().map(|d| d.to_string()).unwrap_or_default(),
                family: PlatformFamily::of_item(item).to_string(),
                contains_point: item.bounding_box().map(|b| b.contains(&location)).unwrap_or(false),
            })?;
        }
        csv_writer.flush()?;

        let selected = match &choice {
            Some(choice) => format!("{} ({}, {})", choice.item.id, choice.platform, choice.date),
            None => "none".to_string(),
        };
        println!("selected: {}", selected);

        self.logger.log(&format!("search ({}, {}) {}: {} items, selected {}",
                                 self.point.latitude, self.point.longitude, self.point.date, items.len(), selected))?;
        Ok(())
    }
}
