//! Settings API endpoint
//!
//! GET/POST /api/settings/nlu_api_key. The key itself is never returned.

use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Request payload for setting the NLU API key
#[derive(Debug, Deserialize)]
pub struct SetApiKeyRequest {
    pub api_key: String,
}

/// Response payload for API key configuration
#[derive(Debug, Serialize)]
pub struct SetApiKeyResponse {
    /// Whether the operation succeeded
    pub success: bool,
    /// Human-readable status message
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
}

/// GET /api/settings/nlu_api_key
pub async fn get_nlu_api_key_status(State(state): State<AppState>) -> Json<ApiKeyStatus> {
    let configured = state
        .nlu_api_key
        .read()
        .await
        .as_deref()
        .is_some_and(crate::config::is_valid_key);

    Json(ApiKeyStatus { configured })
}

/// POST /api/settings/nlu_api_key
///
/// **Request:** `{"api_key": "sk-..."}`
/// **Response:** `{"success": true, "message": "..."}`
///
/// **Behavior:**
/// 1. Validate key (non-empty, non-whitespace)
/// 2. Write to database (authoritative)
/// 3. Swap the key used by the running NLU client
/// 4. Sync to TOML (best-effort backup)
///
/// **Errors:**
/// - 400 Bad Request: Empty or whitespace-only key, or a malformed body
/// - 500 Internal Server Error: Database write failure
pub async fn set_nlu_api_key(
    State(state): State<AppState>,
    payload: Result<Json<SetApiKeyRequest>, JsonRejection>,
) -> ApiResult<Json<SetApiKeyResponse>> {
    let Json(payload) = payload?;
    let api_key = payload.api_key.trim().to_string();

    if !crate::config::is_valid_key(&api_key) {
        return Err(ApiError::BadRequest(
            "API-Schlüssel darf nicht leer sein".to_string(),
        ));
    }

    crate::db::settings::set_nlu_api_key(&state.db, api_key.clone()).await?;

    *state.nlu_api_key.write().await = Some(api_key.clone());

    info!("NLU API key configured via settings endpoint");

    if let Some(toml_path) = &state.config_path {
        if let Err(e) = crate::config::sync_api_key_to_toml(&api_key, toml_path).await {
            warn!("TOML sync failed (database write succeeded): {}", e);
        }
    }

    Ok(Json(SetApiKeyResponse {
        success: true,
        message: "NLU API key configured successfully".to_string(),
    }))
}

/// Build settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new().route(
        "/api/settings/nlu_api_key",
        get(get_nlu_api_key_status).post(set_nlu_api_key),
    )
}
