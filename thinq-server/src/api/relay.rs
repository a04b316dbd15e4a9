use axum::{extract::State, response::Json};
use serde::Serialize;
use thinq_core::StartOutcome;

use super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RelayActionResponse {
    status: &'static str,
}

pub async fn start_listening(
    State(state): State<AppState>,
) -> Result<Json<RelayActionResponse>, ApiError> {
    let status = match state.relay().start().await? {
        StartOutcome::Started => "listening_started",
        StartOutcome::AlreadyListening => "already_listening",
    };
    Ok(Json(RelayActionResponse { status }))
}

pub async fn stop_listening(State(state): State<AppState>) -> Json<RelayActionResponse> {
    let status = if state.relay().stop().await { "listening_stopped" } else { "not_listening" };
    Json(RelayActionResponse { status })
}

#[derive(Serialize)]
pub struct PingResponse {
    esp32_status: u16,
    esp32_response: String,
}

/// Any HTTP answer from the device is reported; only transport failures are errors.
pub async fn test_device(State(state): State<AppState>) -> Result<Json<PingResponse>, ApiError> {
    let outcome = state.relay().ping().await?;
    tracing::info!("🔌 Device ping answered {}", outcome.status);
    Ok(Json(PingResponse { esp32_status: outcome.status, esp32_response: outcome.body }))
}
