//! API Routes
//!
//! Endpoints used by the desk device and the companion app.

mod characters;
mod device;
mod error;
mod relay;
mod selection;
mod todos;

#[cfg(test)]
mod tests;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Serialize;
use thinq_types::RelayStatus;

pub use error::ApiError;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // Diagnostics
        .route("/status", get(get_status))
        // Relay
        .route("/start-listening", post(relay::start_listening))
        .route("/stop-listening", post(relay::stop_listening))
        .route("/test-esp32", post(relay::test_device))
        // Selection
        .route("/select-character", post(selection::select_character))
        .route("/selected-character", get(selection::selected_character))
        // Characters
        .route("/characters", get(characters::list_characters))
        .route("/upload-image", post(characters::upload_image))
        .route("/esp-image", get(characters::esp_image))
        // Todos
        .route("/esp-titles", get(todos::esp_titles))
        .route("/update-todo", post(todos::update_todo))
        .route("/api/todos/progress", get(todos::progress_summary))
        .route("/api/work-sessions", get(todos::work_sessions))
        .route("/api/work-sessions/today", get(todos::today_work_sessions))
        // Device timer and timed completion
        .route("/api/esp32/timer/update", post(device::update_timer))
        .route("/api/esp32/timer/start", post(device::start_timer))
        .route("/api/esp32/timer/stop", post(device::stop_timer))
        .route("/api/esp32/timer/reset", post(device::reset_timer))
        .route("/api/timer", get(device::get_timer))
        .route("/api/timer/start", post(device::start_timer))
        .route("/api/timer/stop", post(device::stop_timer))
        .route("/api/timer/reset", post(device::reset_timer))
        .route("/api/esp32/todos", get(device::open_todos))
        .route("/api/esp32/todo/complete", post(device::complete_todo))
        .fallback(api_not_found)
}

async fn api_not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "Not found"})))
}

#[derive(Serialize)]
pub struct SelectionDiagnostics {
    collection: String,
    selected_id: Option<String>,
    violations_observed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    version: &'static str,
    listening: bool,
    timestamp: String,
    uptime_secs: u64,
    cache_ttl_secs: u64,
    relay: RelayStatus,
    selection: SelectionDiagnostics,
}

async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let selection = state.characters().selection();
    let (selected_id, error) = match selection.get_selected().await {
        Ok(selected) => (selected.map(|s| s.id), None),
        Err(e) => {
            tracing::warn!("⚠️ Selection lookup failed during status: {}", e);
            (None, Some(e.to_string()))
        },
    };
    let relay = state.relay().status();

    Json(StatusResponse {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        listening: relay.listening,
        timestamp: Utc::now().to_rfc3339(),
        uptime_secs: state.uptime_secs(),
        cache_ttl_secs: state.config().cache.ttl_secs,
        relay,
        selection: SelectionDiagnostics {
            collection: selection.collection().to_string(),
            selected_id,
            violations_observed: selection.violations_observed(),
            error,
        },
    })
}
