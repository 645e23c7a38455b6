//! Leaderboard Store - Unified CLI
//!
//! Runs the liveness server or a single record operation against the
//! configured store.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use leaderboard_store::{AppConfig, UserDirectory, health};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)?.with_env()?;

    // One connection for the whole process, shared by every accessor.
    let directory = UserDirectory::connect(&config).await?;

    match cli.command {
        Command::Serve { port, host } => {
            run_server(config.with_listen(host, port), directory).await
        }
        command => run_record_command(&directory, command).await,
    }
}

/// Run the HTTP liveness server
#[instrument(skip(config, directory))]
async fn run_server(config: AppConfig, directory: UserDirectory) -> Result<()> {
    directory.ping().await?;
    info!(backend = %config.backend(), "Backing store reachable");

    info!(host = %config.host(), port = config.port(), "Starting liveness server");
    health::serve(config.host(), *config.port()).await?;
    Ok(())
}

/// Run one record operation and print its result
#[instrument(skip(directory))]
async fn run_record_command(directory: &UserDirectory, command: Command) -> Result<()> {
    match command {
        Command::Serve { .. } => {
            anyhow::bail!("serve is not a record command");
        }
        Command::Show { id } => {
            let profile = directory.user(id)?.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::SetName { id, name } => {
            directory.user(id)?.set_name(name).await?;
        }
        Command::SetScore { id, value } => {
            directory.user(id)?.set_score(value).await?;
        }
        Command::AddScore { id, delta } => {
            let score = directory.user(id)?.add_score(delta).await?;
            println!("{}", score);
        }
        Command::GiveBadge { id, badges } => {
            directory.user(id)?.give_badge(badges).await?;
        }
        Command::TakeBadge { id, badge } => {
            directory.user(id)?.take_badge(badge).await?;
        }
        Command::Delete { id } => {
            directory.user(id)?.delete().await?;
        }
    }

    Ok(())
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,leaderboard_store=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
