//! railsync - One-way TestRail project sync
//!
//! Makes the destination project's milestones, suites, sections, and cases
//! match the source project's.

mod cli;
mod commands;
mod error;
mod logging;
mod settings;


use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::sync::run_sync;
use crate::error::CliError;
use crate::settings::default_config_path;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        tracing::error!("{error}");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => default_config_path()?,
    };

    match cli.command {
        Commands::Sync(args) => run_sync(args, &config_path).await?,
        Commands::Config { command } => run_config(command, &config_path)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
