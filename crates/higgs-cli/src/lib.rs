//! Command-line host for the Higgs Audio companion.
//!
//! Wires the process supervisor and chat session together and exposes them as
//! the `higgs` binary's commands.

#![deny(unsafe_code)]

// Used by the binary target only
use dotenvy as _;
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;
pub mod utils;

// Re-export primary types for convenient access
pub use bootstrap::{CliContext, bootstrap};
pub use commands::Commands;
pub use error::CliError;
pub use parser::{Cli, SettingsArgs};
