use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::Serialize;
use thinq_types::{Fields, TodoProgressSummary, TodoProgressUpdate, WorkSession};

use super::ApiError;
use crate::state::AppState;

pub async fn esp_titles(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.todos().today_titles().await?))
}

#[derive(Serialize)]
pub struct UpdateTodoResponse {
    success: bool,
    id: String,
    updated: Fields,
}

pub async fn update_todo(
    State(state): State<AppState>,
    payload: Result<Json<TodoProgressUpdate>, JsonRejection>,
) -> Result<Json<UpdateTodoResponse>, ApiError> {
    let Json(update) = payload?;
    let doc = state.todos().update_progress(&update).await?;
    Ok(Json(UpdateTodoResponse { success: true, id: doc.id, updated: update.to_fields() }))
}

pub async fn progress_summary(
    State(state): State<AppState>,
) -> Result<Json<TodoProgressSummary>, ApiError> {
    Ok(Json(state.todos().progress_summary().await?))
}

pub async fn work_sessions(State(state): State<AppState>) -> Result<Json<Vec<WorkSession>>, ApiError> {
    Ok(Json(state.todos().work_sessions().await?))
}

pub async fn today_work_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<WorkSession>>, ApiError> {
    Ok(Json(state.todos().today_work_sessions().await?))
}
