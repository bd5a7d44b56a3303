//! # eaptrust-cli
//!
//! Command-line front end for the `eaptrust` handler.
//!
//! ## Commands
//!
//! - **inspect**: decode a PEM chain and check it the way the handler would
//! - **connect**: replay one connection attempt against a saved network
//!   state, answering prompts in the terminal
//! - **config**: show, locate or create configuration files

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
