//! `eaptrust config` - configuration management.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use std::path::Path;

use eaptrust::HandlerConfig;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::{print_json, yes_no, OutputFormat};

pub fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Path => show_path(&ctx),
        ConfigCommands::Init { force } => init_handler_config(&ctx.handler_config, force),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let handler = HandlerConfig::load(&ctx.handler_config)?;

    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({
            "output_format": ctx.output_format,
            "handler_config": ctx.handler_config,
            "state_file": ctx.state_file,
            "handler": handler,
        }))?,
        OutputFormat::Pretty => {
            println!("{}", "Handler Configuration:".bold());
            println!();
            println!("  {} {}", "interface_name:".bold(), handler.interface_name);
            println!(
                "  {} {}",
                "trust_on_first_use_supported:".bold(),
                yes_no(handler.trust_on_first_use_supported)
            );
            println!(
                "  {} {}",
                "insecure_enterprise_allowed:".bold(),
                yes_no(handler.insecure_enterprise_allowed)
            );
            let link = handler
                .help_link()
                .map_or_else(|| "(not set)".dimmed().to_string(), ToString::to_string);
            println!("  {} {}", "ca_cert_help_link:".bold(), link);
        }
    }

    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    let cli = Config::path()?;
    match ctx.output_format {
        OutputFormat::Json => print_json(&json!({
            "config": cli,
            "handler_config": ctx.handler_config,
            "state_file": ctx.state_file,
        }))?,
        OutputFormat::Pretty => {
            println!("{} {}", "config:".bold(), cli.display());
            println!("{} {}", "handler:".bold(), ctx.handler_config.display());
            println!("{} {}", "state:".bold(), ctx.state_file.display());
        }
    }
    Ok(())
}

fn init_handler_config(path: &Path, force: bool) -> Result<()> {
    write_default_handler_config(path, force)?;
    println!("{} wrote {}", "Success:".green().bold(), path.display());
    Ok(())
}

fn write_default_handler_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists\n\n\
             Use --force to overwrite it.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, HandlerConfig::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("handler.toml");
        write_default_handler_config(&path, false).unwrap();
        assert_eq!(HandlerConfig::load(&path).unwrap(), HandlerConfig::default());
    }

    #[test]
    fn init_refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("handler.toml");
        std::fs::write(&path, "interface_name = \"wlan9\"\n").unwrap();

        assert!(write_default_handler_config(&path, false).is_err());
        assert_eq!(HandlerConfig::load(&path).unwrap().interface_name, "wlan9");

        write_default_handler_config(&path, true).unwrap();
        assert_eq!(HandlerConfig::load(&path).unwrap().interface_name, "wlan0");
    }
}
