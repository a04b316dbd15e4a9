//! Desk device focus timer and timed todo completion.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thinq_types::{TimerState, Todo, TodoCompletion, WorkSession};

use super::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct TimerResponse {
    success: bool,
    message: &'static str,
    timer: TimerState,
}

impl TimerResponse {
    fn ok(message: &'static str, timer: TimerState) -> Json<Self> {
        Json(Self { success: true, message, timer })
    }
}

pub async fn get_timer(State(state): State<AppState>) -> Json<TimerState> {
    Json(state.timer().get())
}

pub async fn update_timer(
    State(state): State<AppState>,
    payload: Result<Json<TimerState>, JsonRejection>,
) -> Result<Json<TimerResponse>, ApiError> {
    let Json(reported) = payload?;
    Ok(TimerResponse::ok("Timer state updated", state.timer().update(reported)))
}

pub async fn start_timer(State(state): State<AppState>) -> Json<TimerResponse> {
    TimerResponse::ok("Timer started", state.timer().start())
}

pub async fn stop_timer(State(state): State<AppState>) -> Json<TimerResponse> {
    TimerResponse::ok("Timer stopped", state.timer().stop())
}

pub async fn reset_timer(State(state): State<AppState>) -> Json<TimerResponse> {
    TimerResponse::ok("Timer reset", state.timer().reset())
}

pub async fn open_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.todos().open_todos().await?))
}

/// `todoId` may be a string or a number; times are local `YYYY-MM-DDTHH:MM:SS`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTodoRequest {
    todo_id: Option<Value>,
    start_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    duration_seconds: u64,
}

impl CompleteTodoRequest {
    fn into_completion(self) -> Result<TodoCompletion, ApiError> {
        let todo_id = match self.todo_id {
            Some(Value::String(id)) if !id.trim().is_empty() => id.trim().to_string(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(ApiError::missing("todoId")),
        };
        Ok(TodoCompletion {
            todo_id,
            start_time: parse_time("startTime", self.start_time)?,
            end_time: parse_time("endTime", self.end_time)?,
            duration_seconds: self.duration_seconds,
        })
    }
}

fn parse_time(field: &str, raw: Option<String>) -> Result<NaiveDateTime, ApiError> {
    let raw = raw.ok_or_else(|| ApiError::missing(field))?;
    raw.trim().parse().map_err(|e| ApiError::BadRequest(format!("Invalid {}: {}", field, e)))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTodoResponse {
    success: bool,
    message: String,
    completed_todo: Todo,
    session: WorkSession,
}

pub async fn complete_todo(
    State(state): State<AppState>,
    payload: Result<Json<CompleteTodoRequest>, JsonRejection>,
) -> Result<Json<CompleteTodoResponse>, ApiError> {
    let Json(request) = payload?;
    let completion = request.into_completion()?;
    let (todo, session) = state.todos().complete(&completion).await?;
    Ok(Json(CompleteTodoResponse {
        success: true,
        message: format!("Completed '{}' in {}", todo.title, session.formatted_duration),
        completed_todo: todo,
        session,
    }))
}
