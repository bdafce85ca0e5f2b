//! Ajazz Panel Driver CLI
//!
//! A command-line interface for Ajazz AKP153-class macro key panels.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use ajazz_driver::DriverConfig;

// CLI definitions
mod cli;
use cli::{Cli, Commands};

// Command handlers
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config
    let config_path = cli.config.unwrap_or_else(DriverConfig::default_path);
    debug!("Loading config from {:?}", config_path);
    let config = DriverConfig::load(&config_path)?;
    let dry_run = cli.dry_run;

    match cli.command {
        None => {
            // Default: show panel info
            commands::query::info(&config, dry_run)?;
        }

        // === Query Commands ===
        Some(Commands::Info) => {
            commands::query::info(&config, dry_run)?;
        }
        Some(Commands::Config { save }) => {
            commands::query::config(&config, &config_path, save)?;
        }
        Some(Commands::Read { json }) => {
            commands::read::read(&config, dry_run, json).await?;
        }

        // === Set Commands ===
        Some(Commands::Reset) => {
            commands::set::reset(&config, dry_run)?;
        }
        Some(Commands::Clear) => {
            commands::set::clear(&config, dry_run)?;
        }
        Some(Commands::Brightness { percent }) => {
            commands::set::brightness(&config, dry_run, percent)?;
        }
        Some(Commands::Image { key, file }) => {
            commands::set::image(&config, dry_run, key, &file).await?;
        }
        Some(Commands::Logo { file }) => {
            commands::set::logo(&config, dry_run, &file)?;
        }
        Some(Commands::Standby) => {
            commands::set::standby(&config, dry_run)?;
        }
        Some(Commands::Sleep) => {
            commands::set::sleep(&config, dry_run)?;
        }
        Some(Commands::Wake) => {
            commands::set::wake(&config, dry_run)?;
        }
    }

    Ok(())
}
