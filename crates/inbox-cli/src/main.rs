//! inbox-watch - poll a Notion database for new comments and spawn an agent
//!
//! Meant to be run by a scheduler (cron, systemd timer). Each invocation is a
//! single pass; all settings come from the config file and the environment.
//!
//! Usage:
//!   inbox-watch                     Run once with the default config
//!   inbox-watch --config <file>     Run once with a specific config
//!   inbox-watch --init              Write a default config file and exit
//!
//! Exits non-zero only when configuration or credentials are missing.
//! Upstream failures are written to the run log and the run still succeeds.

use anyhow::{Context, Result};
use clap::Parser;
use inbox_client::{get_gateway_token, get_notion_key, Credential};
use inbox_core::{ActivityLog, WatchConfig};
use inbox_orchestrator::Runner;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "inbox-watch")]
#[command(author, version, about = "Watch a Notion inbox for new comments and spawn an agent")]
struct Cli {
    /// Config file (default: $INBOX_WATCH_CONFIG or ~/.config/inbox-watch/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write a default config file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.unwrap_or_else(WatchConfig::default_path);

    if cli.init {
        WatchConfig::write_default(&config_path)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        println!("Wrote default config to {}", config_path.display());
        println!("Set notion.database_id and notion.author_id before the first run.");
        return Ok(());
    }

    let config = WatchConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let log = ActivityLog::new(config.paths.log_file.clone());

    let (notion_key, gateway_token) = resolve_credentials(&config, &log).await?;

    info!("Using state file {}", config.paths.state_file.display());
    let runner = Runner::from_config(&config, notion_key, gateway_token)
        .context("Failed to build HTTP clients")?;
    runner.run().await;

    Ok(())
}

/// Check the config and resolve both tokens, logging any failure before exiting
async fn resolve_credentials(
    config: &WatchConfig,
    log: &ActivityLog,
) -> Result<(Credential, Credential)> {
    let resolved = config.validate().and_then(|()| {
        let notion_key = get_notion_key(&config.notion)?;
        let gateway_token = get_gateway_token(&config.gateway)?;
        Ok((notion_key, gateway_token))
    });

    match resolved {
        Ok(credentials) => Ok(credentials),
        Err(e) => {
            log.fatal(&e.to_string()).await;
            Err(e).context("Cannot start watcher run")
        }
    }
}
