//! Tidewater CLI - Operational checks against the backend.
//!
//! # Usage
//!
//! ```bash
//! # Is the backend reachable?
//! tw-cli check
//!
//! # Unresolved inventory alerts
//! tw-cli alerts
//!
//! # Every alert, resolved ones included
//! tw-cli alerts --all
//! ```
//!
//! Both commands read the admin console's environment (`BACKEND_API_URL`,
//! `ADMIN_BASE_URL`); `alerts` also needs `TW_ADMIN_EMAIL` and
//! `TW_ADMIN_PASSWORD`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tw-cli")]
#[command(author, version, about = "Tidewater CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the backend answers the CSRF cookie endpoint
    Check,
    /// List inventory alerts
    Alerts {
        /// Include resolved alerts
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Check => commands::check::run().await,
        Commands::Alerts { all } => commands::alerts::run(all).await,
    }
}
