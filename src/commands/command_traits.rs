//! Command pattern interfaces
//!
//! Each CLI subcommand is parsed into a `Command` object by a factory and
//! then executed.

use crate::errors::ScoutResult;
use crate::utils::logger::Logger;

/// An executable CLI operation
pub trait Command {
    /// Execute the command
    fn execute(&self) -> ScoutResult<()>;
}

/// Factory for creating commands from CLI arguments
pub trait CommandFactory<'a> {
    /// Create the command selected by the subcommand in `args`
    ///
    /// # Arguments
    /// * `args` - CLI argument matches from clap
    /// * `logger` - Logger for recording operations
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> ScoutResult<Box<dyn Command + 'a>>;
}
