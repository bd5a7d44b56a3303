//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use eaptrust_core::{EapMethod, NetworkId, Phase2Method};

use crate::output::OutputFormat;

/// Trust-on-first-use for enterprise Wi-Fi networks without a CA certificate
///
/// Inspect server certificate chains and replay connection attempts against
/// a saved network state.
#[derive(Parser, Debug)]
#[command(name = "eaptrust")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Handler config file (overrides the CLI config)
    #[arg(long, env = "EAPTRUST_HANDLER_CONFIG", global = true)]
    pub handler_config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode a PEM chain and check it
    Inspect(InspectArgs),

    /// Replay a connection attempt to a network without a CA certificate
    Connect(ConnectArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PEM bundle, server certificate first
    pub chain: PathBuf,

    /// The bundle lists the root first
    #[arg(long)]
    pub reverse: bool,
}

/// How prompts get answered when not asking in the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AutoAnswer {
    /// Trust the server
    Accept,
    /// Refuse the server
    Reject,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Network SSID
    #[arg(long)]
    pub ssid: String,

    /// Network identifier in the state file
    #[arg(long, default_value = "1")]
    pub network_id: NetworkId,

    /// Outer EAP method (peap, tls, ttls, pwd, ...)
    #[arg(long)]
    pub eap: EapMethod,

    /// Inner method for PEAP/TTLS
    #[arg(long, default_value = "none")]
    pub phase2: Phase2Method,

    /// Inner identity
    #[arg(long, default_value = "")]
    pub identity: String,

    /// Inner password
    #[arg(long, env = "EAPTRUST_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    /// PEM bundle the server presents, server certificate first
    #[arg(long)]
    pub chain: PathBuf,

    /// The bundle lists the root first
    #[arg(long)]
    pub reverse: bool,

    /// Answer every prompt without asking
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "accept")]
    pub auto: Option<AutoAnswer>,

    /// Treat the attempt as an automatic connection (notification first)
    #[arg(long)]
    pub background: bool,

    /// Disable trust-on-first-use for this network
    #[arg(long)]
    pub no_tofu: bool,

    /// State file (overrides the CLI config)
    #[arg(long)]
    pub state: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Show configuration file paths
    Path,

    /// Write a default handler config
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_connect() {
        let cli = Cli::parse_from([
            "eaptrust", "connect", "--ssid", "corp", "--network-id", "4", "--eap", "ttls",
            "--phase2", "mschapv2", "--chain", "chain.pem", "--auto",
        ]);
        let Commands::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        assert_eq!(args.network_id, 4);
        assert_eq!(args.eap, EapMethod::Ttls);
        assert_eq!(args.phase2, Phase2Method::Mschapv2);
        assert_eq!(args.auto, Some(AutoAnswer::Accept));
        assert!(!args.background);
    }

    #[test]
    fn auto_takes_an_optional_answer() {
        let cli = Cli::parse_from([
            "eaptrust", "connect", "--ssid", "corp", "--eap", "peap", "--chain", "c.pem",
            "--auto", "reject",
        ]);
        let Commands::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        assert_eq!(args.auto, Some(AutoAnswer::Reject));
        assert_eq!(args.phase2, Phase2Method::None);
    }
}
