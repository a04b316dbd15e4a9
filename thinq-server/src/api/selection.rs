use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use thinq_types::Character;

use super::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectCharacterRequest {
    #[serde(default)]
    pub character_id: Option<String>,
}

#[derive(Serialize)]
pub struct SelectCharacterResponse {
    success: bool,
    message: String,
    selected_character_id: String,
}

pub async fn select_character(
    State(state): State<AppState>,
    payload: Result<Json<SelectCharacterRequest>, JsonRejection>,
) -> Result<Json<SelectCharacterResponse>, ApiError> {
    let Json(req) = payload?;
    let id = req
        .character_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::missing("character_id"))?;

    state.characters().select(&id).await?;
    tracing::info!("⭐ Character {} selected", id);

    Ok(Json(SelectCharacterResponse {
        success: true,
        message: format!("Character {} selected", id),
        selected_character_id: id,
    }))
}

#[derive(Serialize)]
pub struct SelectedCharacterResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    character: Option<Character>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

/// Nothing selected is a normal answer (`success: false`), not an error.
pub async fn selected_character(
    State(state): State<AppState>,
) -> Result<Json<SelectedCharacterResponse>, ApiError> {
    let response = match state.characters().selected().await? {
        Some(character) => {
            SelectedCharacterResponse { success: true, character: Some(character), message: None }
        },
        None => SelectedCharacterResponse {
            success: false,
            character: None,
            message: Some("No character selected"),
        },
    };
    Ok(Json(response))
}
