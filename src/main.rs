mod bot;
mod config;
mod error;
mod platform;
mod router;
mod session;
mod transport;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::session::{Session, UpdateSource};

/// Relays messages between private chats and a staff group
#[derive(Debug, Parser)]
#[command(name = "relaybot", version, about)]
struct Cli {
    /// Verbose logging, including Bot API traffic
    #[arg(short, long)]
    debug: bool,

    /// Receive updates through the webhook instead of long polling
    #[arg(short, long)]
    updates: bool,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.debug).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Loading configuration from: {}", cli.config.display());
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    info!("  Staff group: {}", config.group_id);

    let session = Session::init(&config, cli.debug)
        .await
        .context("Failed to start bot session")?;

    let source = UpdateSource::from_flag(cli.updates, &config);
    info!("Update mode: {}", source);

    session
        .run(source, Arc::new(config))
        .await
        .context("Failed to acquire updates")?;

    Ok(())
}

/// Request tracing is emitted at `trace` level, so debug mode lets it through
fn default_filter(debug_mode: bool) -> &'static str {
    if debug_mode {
        "debug,teloxide_core::adaptors::trace=trace"
    } else {
        "info"
    }
}
