//! Work sessions recorded when the device completes a todo.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::document::{Document, Fields};
use super::timer::format_duration;

/// Completion report sent by the device once a timed todo is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoCompletion {
    pub todo_id: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: u64,
}

/// One timed stretch of work on a todo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: String,
    pub todo_id: String,
    pub todo_title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration_seconds: u64,
    pub formatted_duration: String,
}

impl WorkSession {
    /// Session for `completion`. The id is derived from the todo and start
    /// time so a repeated report overwrites instead of duplicating.
    pub fn for_completion(completion: &TodoCompletion, todo_title: &str) -> Self {
        Self {
            id: format!(
                "{}-{}",
                completion.todo_id,
                completion.start_time.and_utc().timestamp()
            ),
            todo_id: completion.todo_id.clone(),
            todo_title: todo_title.to_string(),
            start_time: completion.start_time,
            end_time: completion.end_time,
            duration_seconds: completion.duration_seconds,
            formatted_duration: format_duration(completion.duration_seconds),
        }
    }

    /// Returns `None` when the stored times are missing or unparseable.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let time = |key: &str| doc.get_str(key)?.parse::<NaiveDateTime>().ok();
        let duration_seconds = doc.get("duration_seconds").and_then(Value::as_u64).unwrap_or(0);
        Some(Self {
            id: doc.id.clone(),
            todo_id: doc.get_str("todo_id").unwrap_or_default().to_string(),
            todo_title: doc.get_str("todo_title").unwrap_or_default().to_string(),
            start_time: time("start_time")?,
            end_time: time("end_time")?,
            duration_seconds,
            formatted_duration: doc
                .get_str("formatted_duration")
                .map_or_else(|| format_duration(duration_seconds), str::to_string),
        })
    }

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("todo_id".to_string(), Value::from(self.todo_id.clone()));
        fields.insert("todo_title".to_string(), Value::from(self.todo_title.clone()));
        fields.insert("start_time".to_string(), Value::from(iso(&self.start_time)));
        fields.insert("end_time".to_string(), Value::from(iso(&self.end_time)));
        fields.insert("duration_seconds".to_string(), Value::from(self.duration_seconds));
        fields.insert(
            "formatted_duration".to_string(),
            Value::from(self.formatted_duration.clone()),
        );
        fields
    }

    pub fn started_on(&self, date: NaiveDate) -> bool {
        self.start_time.date() == date
    }
}

fn iso(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Completed/total counts across all todos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoProgressSummary {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub progress_percentage: f64,
    pub timestamp: NaiveDateTime,
}

impl TodoProgressSummary {
    pub fn new(total_todos: usize, completed_todos: usize, timestamp: NaiveDateTime) -> Self {
        let progress_percentage = if total_todos == 0 {
            0.0
        } else {
            completed_todos as f64 * 100.0 / total_todos as f64
        };
        Self { total_todos, completed_todos, progress_percentage, timestamp }
    }
}
