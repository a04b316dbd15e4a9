//! Change records emitted by the store and the envelopes the relay sends to the device.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Fields;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// One observed mutation of a document.
///
/// `observed_at` is assigned by the store adapter and never decreases within
/// one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub entity_id: String,
    pub kind: ChangeKind,
    pub payload: Fields,
    pub observed_at: DateTime<Utc>,
}

impl ChangeRecord {
    pub fn added(entity_id: impl Into<String>, payload: Fields, observed_at: DateTime<Utc>) -> Self {
        Self { entity_id: entity_id.into(), kind: ChangeKind::Added, payload, observed_at }
    }

    pub fn modified(
        entity_id: impl Into<String>,
        payload: Fields,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self { entity_id: entity_id.into(), kind: ChangeKind::Modified, payload, observed_at }
    }

    pub fn removed(entity_id: impl Into<String>, observed_at: DateTime<Utc>) -> Self {
        Self {
            entity_id: entity_id.into(),
            kind: ChangeKind::Removed,
            payload: Fields::new(),
            observed_at,
        }
    }
}

/// Action verb understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryAction {
    Create,
    Update,
    Delete,
    /// Connectivity ping, never produced from a change record
    Test,
}

impl DeliveryAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Test => "test",
        }
    }
}

impl From<ChangeKind> for DeliveryAction {
    fn from(kind: ChangeKind) -> Self {
        match kind {
            ChangeKind::Added => Self::Create,
            ChangeKind::Modified => Self::Update,
            ChangeKind::Removed => Self::Delete,
        }
    }
}

/// JSON body POSTed to the device for one change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryEnvelope {
    pub action: DeliveryAction,
    pub id: String,
    pub data: Fields,
    /// Unix seconds with microsecond precision
    pub timestamp: f64,
}

impl DeliveryEnvelope {
    #[allow(clippy::cast_precision_loss, reason = "microsecond timestamps fit in f64 mantissa")]
    pub fn from_change(change: &ChangeRecord) -> Self {
        let data = match change.kind {
            ChangeKind::Removed => Fields::new(),
            ChangeKind::Added | ChangeKind::Modified => change.payload.clone(),
        };
        Self {
            action: change.kind.into(),
            id: change.entity_id.clone(),
            data,
            timestamp: change.observed_at.timestamp_micros() as f64 / 1_000_000.0,
        }
    }
}

/// Relay-local bookkeeping for one forwarded change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayDeliveryAttempt {
    pub change: ChangeRecord,
    pub attempt_count: u32,
    pub last_error: Option<String>,
    pub delivered: bool,
}

impl RelayDeliveryAttempt {
    pub fn new(change: ChangeRecord) -> Self {
        Self { change, attempt_count: 0, last_error: None, delivered: false }
    }

    pub const fn has_attempts_left(&self, max_attempts: u32) -> bool {
        !self.delivered && self.attempt_count < max_attempts
    }

    /// Count a new attempt and return its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempt_count = self.attempt_count.saturating_add(1);
        self.attempt_count
    }

    pub fn record_failure(&mut self, error: impl ToString) {
        self.last_error = Some(error.to_string());
    }

    pub fn mark_delivered(&mut self) {
        self.delivered = true;
    }
}
