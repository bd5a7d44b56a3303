//! Command implementations.

pub mod config;
pub mod connect;
pub mod inspect;

use std::path::PathBuf;

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output format
    pub output_format: OutputFormat,

    /// Handler config file
    pub handler_config: PathBuf,

    /// Saved network state
    pub state_file: PathBuf,

    /// Verbose output
    pub verbose: bool,
}
