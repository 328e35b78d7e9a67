//! Voice command endpoints
//!
//! POST /api/voice/dashboard-command, /api/voice/time-entry, /api/voice/advanced
//! and the side-effect-free /api/voice/classify.
//!
//! A well-formed request always gets 200: classification, resolution and
//! write failures are reported inside the body. Only a blank transcript is
//! rejected (400).

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::models::{
    Classification, CustomerExtraction, DashboardCommand, Mode, ResultSummary, TimeEntryCommand,
};
use crate::{ApiError, ApiResult, AppState};

/// Request payload carrying a speech transcript
///
/// **Request:** `{"transcript": "Neue Baustelle für Herrn Müller, Hauptstraße 5, Hamburg"}`
#[derive(Debug, Deserialize)]
pub struct TranscriptRequest {
    /// Missing is treated like empty so both answer 400
    #[serde(default)]
    pub transcript: String,
}

/// Request payload for classification without side effects
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    #[serde(default)]
    pub transcript: String,
    pub mode: Mode,
}

fn validate_transcript(transcript: &str) -> ApiResult<&str> {
    let transcript = transcript.trim();
    if transcript.is_empty() {
        return Err(ApiError::BadRequest(
            "Transkript darf nicht leer sein".to_string(),
        ));
    }
    Ok(transcript)
}

/// POST /api/voice/dashboard-command
pub async fn dashboard_command(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> ApiResult<Json<ResultSummary<DashboardCommand>>> {
    let Json(payload) = payload?;
    let transcript = validate_transcript(&payload.transcript)?;
    tracing::debug!(transcript_len = transcript.len(), "Dashboard command received");

    Ok(Json(state.pipeline.run_dashboard(transcript).await))
}

/// POST /api/voice/time-entry
///
/// Classification only; nothing is written.
pub async fn time_entry(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> ApiResult<Json<TimeEntryCommand>> {
    let Json(payload) = payload?;
    let transcript = validate_transcript(&payload.transcript)?;
    tracing::debug!(transcript_len = transcript.len(), "Time entry transcript received");

    Ok(Json(state.pipeline.analyze_time_entry(transcript).await))
}

/// POST /api/voice/advanced
pub async fn advanced(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> ApiResult<Json<ResultSummary<CustomerExtraction>>> {
    let Json(payload) = payload?;
    let transcript = validate_transcript(&payload.transcript)?;
    tracing::debug!(transcript_len = transcript.len(), "Advanced transcript received");

    Ok(Json(state.pipeline.run_advanced(transcript).await))
}

/// POST /api/voice/classify
///
/// **Request:** `{"transcript": "...", "mode": "dashboard" | "time_entry" | "advanced"}`
pub async fn classify(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> ApiResult<Json<Classification>> {
    let Json(payload) = payload?;
    let transcript = validate_transcript(&payload.transcript)?;

    Ok(Json(
        state
            .pipeline
            .classifier()
            .classify(transcript, payload.mode)
            .await,
    ))
}

/// Build voice command routes
pub fn voice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/voice/dashboard-command", post(dashboard_command))
        .route("/api/voice/time-entry", post(time_entry))
        .route("/api/voice/advanced", post(advanced))
        .route("/api/voice/classify", post(classify))
}
