//! Prints the bounding box around a coordinate

use clap::ArgMatches;

use crate::commands::command_traits::Command;
use crate::commands::parse_arg;
use crate::coordinate::BoundingBox;
use crate::errors::{ScoutError, ScoutResult};
use crate::utils::logger::Logger;

pub struct BboxCommand<'a> {
    latitude: f64,
    longitude: f64,
    buffer_meters: f64,
    logger: &'a Logger,
}

impl<'a> BboxCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> ScoutResult<Self> {
        let buffer_meters: f64 = parse_arg(args, "buffer")?;
        if buffer_meters <= 0.0 {
            return Err(ScoutError::GenericError("--buffer must be positive".to_string()));
        }

        Ok(BboxCommand {
            latitude: parse_arg(args, "lat")?,
            longitude: parse_arg(args, "lon")?,
            buffer_meters,
            logger,
        })
    }
}

impl<'a> Command for BboxCommand<'a> {
    fn execute(&self) -> ScoutResult<()> {
        let bbox = BoundingBox::around(self.latitude, self.longitude, self.buffer_meters);
        let [min_lon, min_lat, max_lon, max_lat] = bbox.to_array();

        self.logger.log(&format!("bbox ({}, {}) +{} m", self.latitude, self.longitude, self.buffer_meters))?;
        println!("{},{},{},{}", min_lon, min_lat, max_lon, max_lat);
        Ok(())
    }
}
