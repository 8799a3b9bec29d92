//! Pipeline run over the configured points

use clap::ArgMatches;
use log::info;

use crate::api::PondScout;
use crate::commands::command_traits::Command;
use crate::config::ScoutConfig;
use crate::errors::{ScoutError, ScoutResult};
use crate::store::ArrayFormat;
use crate::utils::logger::Logger;

pub struct RunCommand<'a> {
    config_path: String,
    /// Overrides `output.format`
    format: Option<ArrayFormat>,
    /// Forces feature computation on
    features: bool,
    progress: bool,
    logger: &'a Logger,
}

impl<'a> RunCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> ScoutResult<Self> {
        let config_path = args.get_one::<String>("config")
            .ok_or_else(|| ScoutError::GenericError("Missing --config".to_string()))?
            .clone();

        let format = args.get_one::<String>("format")
            .map(|f| f.parse::<ArrayFormat>())
            .transpose()?;

        Ok(RunCommand {
            config_path,
            format,
            features: args.get_flag("features"),
            progress: !args.get_flag("no-progress"),
            logger,
        })
    }
}

impl<'a> Command for RunCommand<'a> {
    fn execute(&self) -> ScoutResult<()> {
        let mut config = ScoutConfig::load(&self.config_path)?;
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.features {
            config.output.compute_features = true;
        }

        let scout = PondScout::new(config)?;
        let report = scout.run(self.progress)?;

        self.logger.log(&format!("run {}: {}", self.config_path, report.summary()))?;
        info!("Report written to {}", scout.report_path().display());

        println!("{}", report.summary());
        let errored = report.errored();
        if !errored.is_empty() {
            println!("errored: {:?}", errored);
        }

        Ok(())
    }
}
