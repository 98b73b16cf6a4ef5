//! Parley application binary - composition root.
//!
//! Ties the Parley crates together into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite database and run migrations
//! 3. Build the dialogue engine over the storage gateway
//! 4. Start the axum REST API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use parley_api::{routes, AppState};
use parley_core::config::ParleyConfig;
use parley_dialogue::DialogueEngine;
use parley_storage::{Database, SqliteGateway};

use cli::CliArgs;

/// Expand a leading `~/` against the home directory.
fn resolve_data_dir(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(raw)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);

    // CLI overrides beat the config file.
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(log_level) = args.resolve_log_level() {
        config.general.log_level = log_level;
    }
    config.general.port = args.resolve_port(config.general.port);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!(config = %config_file.display(), "Parley starting");

    let db_path = resolve_data_dir(&config.general.data_dir).join("parley.db");
    let database = Arc::new(Database::new(&db_path)?);
    let gateway = Arc::new(SqliteGateway::new(
        database,
        config.dialogue.session_timeout_hours,
    ));
    let engine = DialogueEngine::new(gateway, &config.dialogue);

    let state = AppState::new(config, engine);
    routes::serve(state).await?;

    Ok(())
}
