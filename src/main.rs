//! imagesync: keeps the product-image reference table in step with the
//! mounted image repository.

mod error;
mod pass;
mod purge;
mod schedule;

use crate::schedule::SystemClock;
use clap::{Parser, Subcommand};
use imagesync_config::Config;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imagesync", version, about = "Reconciles a product-image directory with its database reference table")]
struct Cli {
    /// Path to the configuration file (defaults to ./imagesync.toml).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reconciliation service until killed.
    Run,
    /// Delete repository files whose names are not product codes.
    Purge {
        /// Only report what would be deleted.
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = ?err, "refusing to start with invalid configuration");
            return ExitCode::FAILURE;
        },
    };

    match cli.command {
        Command::Run => {
            let clock = SystemClock::new(config.utc_offset());
            // Loops forever; process lifetime is service lifetime.
            schedule::run(&config, &clock).await;
            ExitCode::SUCCESS
        },
        Command::Purge { dry_run } => match purge::purge(&config.repository.mount_point, dry_run).await {
            Ok(report) if report.failed == 0 => ExitCode::SUCCESS,
            Ok(_) => ExitCode::FAILURE,
            Err(err) => {
                tracing::error!(error = ?err, "repository sweep failed");
                ExitCode::FAILURE
            },
        },
    }
}
