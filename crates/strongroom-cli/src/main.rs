//! Strongroom CLI entry point.
//!
//! Binary name: `strongroom`
//!
//! Parses CLI arguments, resolves the store configuration, then dispatches to
//! the command handler.

mod cli;
mod state;

use clap::Parser;

use cli::{Cli, Commands};
use state::{AppState, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    strongroom_observe::init_tracing(cli.verbose, cli.quiet, cli.json)
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    let settings = Settings::load().await?;

    match cli.command {
        Commands::Status => {
            cli::status::status(&settings, cli.json).await?;
        }

        Commands::Credential { action } => {
            let state = AppState::init(&settings, cli.passphrase).await?;
            let result = cli::credential::handle_credential_command(action, &state, cli.json).await;
            state.shutdown().await;
            result?;
        }
    }

    Ok(())
}
