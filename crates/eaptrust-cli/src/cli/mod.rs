//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing::Level;

use crate::config::Config;
use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean.
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(!cli.no_color)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load()?;

    let output_format = cli
        .output
        .or(config.output_format)
        .unwrap_or(OutputFormat::Pretty);

    let handler_config = match cli.handler_config {
        Some(path) => path,
        None => config.handler_config_path()?,
    };

    let ctx = commands::Context {
        output_format,
        handler_config,
        state_file: config.state_path()?,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Inspect(args) => commands::inspect::execute(ctx, args).await,
        Commands::Connect(args) => commands::connect::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args),
    }
}
