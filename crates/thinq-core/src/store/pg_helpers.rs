//! Helper functions for PostgreSQL document operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use thinq_types::{ChangeKind, Document, Fields, StoreError};

use super::StoreResult;

/// NOTIFY channel written by the `documents_notify` trigger.
pub(crate) const CHANGE_CHANNEL: &str = "thinq_changes";

pub(crate) const DOCUMENT_COLUMNS: &str = "collection, id, fields, updated_at";

/// Payload of one `thinq_changes` notification.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChangeNotification {
    pub collection: String,
    pub id: String,
    pub op: ChangeKind,
    pub at: DateTime<Utc>,
}

impl ChangeNotification {
    pub(crate) fn modified(collection: &str, id: &str, at: DateTime<Utc>) -> Self {
        Self { collection: collection.to_string(), id: id.to_string(), op: ChangeKind::Modified, at }
    }

    pub(crate) fn to_payload(&self) -> StoreResult<String> {
        serde_json::to_string(self)
            .map_err(|e| StoreError::Serialization { message: e.to_string() })
    }

    pub(crate) fn parse(payload: &str) -> Option<Self> {
        match serde_json::from_str(payload) {
            Ok(notification) => Some(notification),
            Err(e) => {
                tracing::warn!("Ignoring malformed change notification '{}': {}", payload, e);
                None
            },
        }
    }
}

/// Convert a PostgreSQL row to a Document.
pub(crate) fn row_to_document(row: &sqlx::postgres::PgRow) -> StoreResult<Document> {
    let fields: serde_json::Value = row.try_get("fields").map_err(map_sqlx_err)?;
    let serde_json::Value::Object(fields) = fields else {
        return Err(StoreError::Serialization {
            message: "document fields are not a JSON object".to_string(),
        });
    };
    Ok(Document {
        id: row.try_get("id").map_err(map_sqlx_err)?,
        collection: row.try_get("collection").map_err(map_sqlx_err)?,
        fields,
        updated_at: row.try_get("updated_at").map_err(map_sqlx_err)?,
    })
}

pub(crate) fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(fields.clone())
}

/// `LIMIT` argument; NULL means unbounded.
pub(crate) fn limit_param(limit: Option<usize>) -> Option<i64> {
    limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX))
}

/// Map sqlx error to store error.
pub(crate) fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization { message: err.to_string() }
        },
        other => StoreError::unavailable(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger_payload() {
        let payload = r#"{"collection":"todos","id":"t1","op":"modified","at":"2026-10-18T09:30:00.123456+00:00"}"#;
        let Some(note) = ChangeNotification::parse(payload) else {
            panic!("payload should parse");
        };
        assert_eq!(note.collection, "todos");
        assert_eq!(note.op, ChangeKind::Modified);
        assert_eq!(note.at.timestamp_subsec_micros(), 123_456);
    }

    #[test]
    fn test_commit_payload_matches_trigger_shape() {
        let at = "2026-10-18T09:30:00Z".parse::<DateTime<Utc>>().unwrap_or_default();
        let Ok(payload) = ChangeNotification::modified("characters", "x", at).to_payload() else {
            panic!("payload should serialize");
        };
        assert!(payload.contains(r#""op":"modified""#));
        let Some(note) = ChangeNotification::parse(&payload) else {
            panic!("payload should parse");
        };
        assert_eq!((note.collection.as_str(), note.id.as_str(), note.at), ("characters", "x", at));
    }

    #[test]
    fn test_parse_rejects_unknown_op() {
        assert!(ChangeNotification::parse(r#"{"collection":"todos","id":"t1","op":"moved","at":"2026-10-18T09:30:00Z"}"#).is_none());
    }

    #[test]
    fn test_limit_param() {
        assert_eq!(limit_param(None), None);
        assert_eq!(limit_param(Some(20)), Some(20));
    }

    #[test]
    fn test_pool_errors_are_transient() {
        assert!(map_sqlx_err(sqlx::Error::PoolTimedOut).is_transient());
    }
}
