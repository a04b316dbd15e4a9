//! Todo records as seen by the desk device.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{Document, Fields};

/// Device view of a todo document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub is_completed: bool,
    /// Local due date, `YYYY-MM-DD`
    pub due_date_string: Option<String>,
    pub start_time: Option<Value>,
    pub stop_time: Option<Value>,
    pub pause_times: Option<Value>,
    pub resume_times: Option<Value>,
}

impl Todo {
    /// Lenient projection; fields with unexpected types read as absent.
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id.clone(),
            title: doc.get_str("title").unwrap_or_default().to_string(),
            is_completed: doc.get_bool("is_completed").unwrap_or(false),
            due_date_string: doc.get_str("due_date_string").map(str::to_string),
            start_time: doc.get("start_time").cloned(),
            stop_time: doc.get("stop_time").cloned(),
            pause_times: doc.get("pause_times").cloned(),
            resume_times: doc.get("resume_times").cloned(),
        }
    }

    pub fn is_due_on(&self, date: &str) -> bool {
        self.due_date_string.as_deref() == Some(date)
    }
}

/// Progress report from the device, addressed by todo title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoProgressUpdate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<Value>,
    /// Stored as `pause_times`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_time: Option<Value>,
    /// Stored as `resume_times`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_time: Option<Value>,
}

impl TodoProgressUpdate {
    /// Fields merged into the stored todo.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("is_completed".to_string(), Value::Bool(self.is_completed));
        let optional = [
            ("start_time", &self.start_time),
            ("stop_time", &self.stop_time),
            ("pause_times", &self.pause_time),
            ("resume_times", &self.resume_time),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.insert(key.to_string(), value.clone());
            }
        }
        fields
    }
}
