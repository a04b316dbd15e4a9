use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use thinq_types::{Character, NewCharacter};

use super::ApiError;
use crate::state::AppState;

pub async fn list_characters(
    State(state): State<AppState>,
) -> Result<Json<Vec<Character>>, ApiError> {
    Ok(Json(state.characters().list().await?))
}

#[derive(Serialize)]
pub struct EspImageResponse {
    image_url: String,
}

pub async fn esp_image(State(state): State<AppState>) -> Result<Json<EspImageResponse>, ApiError> {
    match state.characters().esp_image().await {
        Ok(image_url) => Ok(Json(EspImageResponse { image_url })),
        Err(e) if e.is_not_found() => {
            let message = match state.characters().selected().await? {
                None => "No selected character found",
                Some(_) => "No image URL found",
            };
            Err(ApiError::NotFound(message.to_string()))
        },
        Err(e) => Err(e.into()),
    }
}

/// Inline image upload; `image_data` is stored as the character's image URL.
#[derive(Debug, Deserialize)]
pub struct UploadImageRequest {
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct UploadImageResponse {
    success: bool,
    character_id: String,
    message: String,
}

pub async fn upload_image(
    State(state): State<AppState>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<Json<UploadImageResponse>, ApiError> {
    let Json(req) = payload?;
    let image_url =
        req.image_data.filter(|data| !data.is_empty()).ok_or_else(|| ApiError::missing("image_data"))?;

    let new = NewCharacter {
        name: req
            .name
            .unwrap_or_else(|| format!("Uploaded image_{}", Local::now().format("%H%M%S"))),
        prompt: req.prompt.unwrap_or_else(|| "Directly uploaded image".to_string()),
        image_url,
        generation_type: "upload".to_string(),
        style: "uploaded".to_string(),
        user_id: req.user_id.unwrap_or_else(|| "test_user".to_string()),
    };
    let character = state.characters().create(new).await?;

    Ok(Json(UploadImageResponse {
        success: true,
        message: format!("Image '{}' saved", character.name),
        character_id: character.id,
    }))
}
