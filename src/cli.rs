//! Command-line interface for leaderboard_store.

use clap::{Parser, Subcommand};

/// Leaderboard Store - user profiles, badges and ranks over a key-value store
#[derive(Parser, Debug)]
#[command(name = "leaderboard_store")]
#[command(about = "User profile and leaderboard store", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (defaults apply if it does not exist)
    #[arg(short, long, global = true, default_value = "leaderboard.toml")]
    pub config: std::path::PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP liveness server
    Serve {
        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print a user's record as JSON
    Show {
        /// User id
        id: String,
    },

    /// Set a user's display name
    SetName {
        /// User id
        id: String,
        /// New display name
        name: String,
    },

    /// Overwrite a user's score
    SetScore {
        /// User id
        id: String,
        /// New score
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Add to a user's score and print the new total
    AddScore {
        /// User id
        id: String,
        /// Amount to add (may be negative)
        #[arg(allow_hyphen_values = true)]
        delta: String,
    },

    /// Give one or more badges to a user
    GiveBadge {
        /// User id
        id: String,
        /// Badge ids
        #[arg(required = true)]
        badges: Vec<i64>,
    },

    /// Take a badge from a user
    TakeBadge {
        /// User id
        id: String,
        /// Badge id
        badge: i64,
    },

    /// Delete every key belonging to a user
    Delete {
        /// User id
        id: String,
    },
}
