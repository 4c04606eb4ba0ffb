//! medilink - command-line front end for the MediLink+ portals
//!
//! Loads configuration, opens the SQLite slot store under the resolved root
//! folder, seeds the demo records and runs one portal command. Ctrl+C
//! cancels an outstanding transcription. Failures the user can correct exit
//! with status 2; anything else propagates as an error.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use medilink_common::config::{LoggingConfig, TomlConfig};
use medilink_common::{RecordStore, SqliteSlots};
use medilink_portal::cli::Cli;
use medilink_portal::commands::{self, RunContext};
use medilink_portal::Portal;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = TomlConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!(
        "Starting MediLink+ (medilink) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = config.resolve_root_folder(cli.root_folder.as_deref());
    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let slots = SqliteSlots::open(&db_path)
        .await
        .with_context(|| format!("Failed to open record store at {}", db_path.display()))?;
    let store = RecordStore::new(Arc::new(slots));
    let portal = Portal::new(store, config.admin.clone(), config.transcription.timeout());

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    let ctx = RunContext {
        portal,
        transcription: config.transcription,
        cancel,
        json: cli.json,
    };
    match commands::run(&ctx, cli.command).await {
        Err(e) if commands::is_user_error(&e) => {
            warn!(error = %e, "Command refused");
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
        result => result,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, cancelling");
            cancel.cancel();
        }
        Err(e) => warn!("Failed to install Ctrl+C handler: {}", e),
    }
}
