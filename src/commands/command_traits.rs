//! Command pattern interfaces
//!
//! Each CLI subcommand is parsed into a [`Command`] up front, so argument
//! errors surface before any work starts.

use crate::config::MosaicConfig;
use crate::errors::MosaicResult;

/// An executable CLI operation
pub trait Command {
    fn execute(&self) -> MosaicResult<()>;
}

/// Builds the command selected on the command line
pub trait CommandFactory<'a> {
    /// Create the command for the chosen subcommand
    ///
    /// # Arguments
    /// * `args` - Top-level argument matches from clap
    /// * `config` - Loaded configuration the command runs with
    fn create_command(&self, args: &clap::ArgMatches, config: &'a MosaicConfig)
                      -> MosaicResult<Box<dyn Command + 'a>>;
}
