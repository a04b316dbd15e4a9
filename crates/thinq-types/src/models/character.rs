//! Character records and the exclusive-selection view of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{Document, Fields};
use crate::error::StoreError;

/// Field carrying the exclusive selection flag.
pub const SELECTED_FIELD: &str = "is_selected";

/// Character document as stored in the `characters` collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    #[serde(rename = "character_id")]
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub prompt: String,
    pub generation_type: String,
    pub image_url: String,
    pub style: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub is_selected: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Character {
    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let mut character: Self =
            serde_json::from_value(serde_json::Value::Object(doc.fields.clone())).map_err(
                |e| StoreError::Serialization {
                    message: format!("character {}: {}", doc.id, e),
                },
            )?;
        character.id.clone_from(&doc.id);
        Ok(character)
    }

    pub fn to_fields(&self) -> Result<Fields, StoreError> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(fields)) => Ok(fields),
            Ok(other) => Err(StoreError::Serialization {
                message: format!("character serialized to non-object: {}", other),
            }),
            Err(e) => Err(StoreError::Serialization { message: e.to_string() }),
        }
    }
}

/// Input for creating a character record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub prompt: String,
    pub image_url: String,
    pub generation_type: String,
    pub style: String,
    pub user_id: String,
}

/// Any record participating in exclusive selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectableEntity {
    pub id: String,
    pub is_selected: bool,
}

impl From<&Document> for SelectableEntity {
    fn from(doc: &Document) -> Self {
        Self { id: doc.id.clone(), is_selected: doc.get_bool(SELECTED_FIELD).unwrap_or(false) }
    }
}
