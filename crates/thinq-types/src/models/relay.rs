//! Relay diagnostics exposed through `/status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::change::RelayDeliveryAttempt;

/// Point-in-time snapshot of the change-feed relay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayStatus {
    /// Whether a subscription is currently active
    pub listening: bool,
    /// Collection being watched
    pub collection: String,
    /// Downstream device endpoint
    pub endpoint: String,
    /// When the current (or last) subscription was opened
    pub started_at: Option<DateTime<Utc>>,
    /// Change batches received from the store
    pub batches_received: u64,
    /// Change records classified
    pub records_processed: u64,
    /// Records acknowledged with 2xx
    pub delivered: u64,
    /// Records that exhausted their attempts
    pub failed: u64,
    /// Most recent subscription or delivery error
    pub last_error: Option<String>,
    /// Time of the most recent change batch
    pub last_event_at: Option<DateTime<Utc>>,
    /// Newest last; bounded
    pub recent_failures: Vec<RelayDeliveryAttempt>,
}
