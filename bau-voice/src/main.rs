//! bau-voice - Voice command service
//!
//! **Module Identity:**
//! - Name: bau-voice
//! - Default port: 5730
//!
//! Turns spoken commands from the construction-site app into projects, tasks,
//! time entries and material orders.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bau_common::config::{RootFolderInitializer, RootFolderResolver};
use bau_voice::db::SqliteStore;
use bau_voice::services::{api_key_handle, OpenAiClient, VoicePipeline};
use bau_voice::AppState;

#[derive(Debug, Parser)]
#[command(
    name = "bau-voice",
    version,
    about = "Voice command service for construction-site management"
)]
struct Args {
    /// Root folder holding the database
    #[arg(long)]
    root_folder: Option<PathBuf>,

    /// HTTP port (overrides the TOML config)
    #[arg(long)]
    port: Option<u16>,

    /// TOML config file
    #[arg(long, env = "BAU_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(bau_common::config::default_config_path);
    let toml_config = bau_common::config::load_toml_config(&config_path);

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&toml_config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting bau-voice (voice command service)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Config: {}", config_path.display());

    // Step 1: Resolve root folder
    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();

    // Step 2: Create root folder directory if missing
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;

    // Step 3: Open or create database
    let db_path = initializer.database_path();
    info!("Database: {}", db_path.display());
    let db_pool = bau_common::db::init_database(&db_path).await?;
    info!("Database connection established");

    // Step 4: NLU client with the resolved API key
    let api_key = bau_voice::config::resolve_nlu_api_key(&db_pool, &toml_config).await?;
    let api_key = api_key_handle(api_key);
    let nlu = OpenAiClient::new(&toml_config.nlu, api_key.clone())?;
    info!(endpoint = %toml_config.nlu.endpoint, model = %toml_config.nlu.model, "NLU client ready");

    let store = SqliteStore::new(db_pool.clone());
    let pipeline = VoicePipeline::new(Arc::new(nlu), Arc::new(store));
    let state = AppState::new(db_pool, pipeline, api_key).with_config_path(config_path);

    let app = bau_voice::build_router(state);

    let port = args.port.unwrap_or(toml_config.port);
    let addr = format!("{}:{}", toml_config.bind_address, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
