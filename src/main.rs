mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "calmirror")]
#[command(about = "Mirror calendar event instances from a source CalDAV calendar into a target")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one reconciliation pass from the source calendar into the target
    Sync {
        /// Path to the config file (defaults to ~/.config/calmirror/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Sync { config } => {
            let config = Config::load(config.as_deref())?;
            commands::sync::run(&config).await
        }
    }
}

/// Initialize logging with environment-based configuration.
fn init_logging() -> Result<()> {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,reqwest=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set up logging: {e}"))?;

    Ok(())
}
