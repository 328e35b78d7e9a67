//! bau-voice library interface
//!
//! Voice command pipeline for construction-site management: a transcript is
//! classified into a structured command, the customer and site it mentions
//! are resolved (or created), and the implied record is written.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower_http::trace::TraceLayer;

use crate::services::{ApiKeyHandle, VoicePipeline};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Classifier, resolver and materializer
    pub pipeline: VoicePipeline,
    /// NLU API key shared with the completion client
    pub nlu_api_key: ApiKeyHandle,
    /// TOML file the settings endpoint mirrors the API key into
    pub config_path: Option<PathBuf>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, pipeline: VoicePipeline, nlu_api_key: ApiKeyHandle) -> Self {
        Self {
            db,
            pipeline,
            nlu_api_key,
            config_path: None,
            startup_time: Utc::now(),
        }
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::voice_routes())
        .merge(api::settings_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
