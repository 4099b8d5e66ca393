//! CLI command definitions for the `strongroom` binary.
//!
//! Uses clap derive macros for argument parsing. Commands follow a
//! noun-verb pattern (e.g., `strongroom credential add`).

pub mod credential;
pub mod status;

use clap::{Parser, Subcommand};

/// Keep credentials encrypted at rest in a relational store.
#[derive(Parser)]
#[command(name = "strongroom", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Vault passphrase. Prompted for when not set.
    #[arg(long, env = "STRONGROOM_PASSPHRASE", hide_env_values = true, global = true)]
    pub passphrase: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage stored credentials (add, show, update, delete).
    #[command(alias = "cred")]
    Credential {
        #[command(subcommand)]
        action: credential::CredentialCommand,
    },

    /// Show which store and configuration are in use.
    Status,
}
