//! CLI command implementations
//!
//! One command per subcommand of the `pondscout` binary.

pub mod command_traits;
pub mod run_command;
pub mod bbox_command;
pub mod search_command;
pub mod features_command;

pub use command_traits::{Command, CommandFactory};
pub use run_command::RunCommand;
pub use bbox_command::BboxCommand;
pub use search_command::SearchCommand;
pub use features_command::FeaturesCommand;

use clap::ArgMatches;

use crate::errors::{ScoutError, ScoutResult};
use crate::utils::logger::Logger;

/// Creates the command for the subcommand given on the command line
pub struct ScoutCommandFactory;

impl ScoutCommandFactory {
    pub fn new() -> Self {
        ScoutCommandFactory
    }
}

impl Default for ScoutCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for ScoutCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> ScoutResult<Box<dyn Command + 'a>> {
        match args.subcommand() {
            Some(("run", sub)) => Ok(Box::new(RunCommand::new(sub, logger)?)),
            Some(("bbox", sub)) => Ok(Box::new(BboxCommand::new(sub, logger)?)),
            Some(("search", sub)) => Ok(Box::new(SearchCommand::new(sub, logger)?)),
            Some(("features", sub)) => Ok(Box::new(FeaturesCommand::new(sub, logger)?)),
            Some((other, _)) => Err(ScoutError::GenericError(format!("Unknown command: {}", other))),
            None => Err(ScoutError::GenericError("No command given, see --help".to_string())),
        }
    }
}

/// Reads a required argument and parses it
pub(crate) fn parse_arg<T: std::str::FromStr>(args: &ArgMatches, name: &str) -> ScoutResult<T> {
    let raw = args.get_one::<String>(name)
        .ok_or_else(|| ScoutError::GenericError(format!("Missing --{}", name)))?;
    raw.trim().parse::<T>()
        .map_err(|_| ScoutError::GenericError(format!("Invalid value for --{}: {}", name, raw)))
}
