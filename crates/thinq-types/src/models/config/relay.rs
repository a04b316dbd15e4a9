//! Change-feed relay configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RelayConfig {
    /// Collection whose changes are forwarded
    #[validate(length(min = 1_u64))]
    pub collection: String,
    /// Device endpoint receiving change envelopes
    #[validate(url)]
    pub endpoint: String,
    /// Per-request timeout in seconds
    #[validate(range(min = 1_u64, max = 300_u64))]
    pub request_timeout_secs: u64,
    /// Total attempts per record, first try included
    #[validate(range(min = 1_u32, max = 20_u32))]
    pub max_attempts: u32,
    /// Fixed pause between attempts
    #[validate(range(max = 60_000_u64))]
    pub retry_delay_ms: u64,
    /// Permanently failed deliveries kept for diagnostics
    #[validate(range(max = 10_000_usize))]
    pub failure_history: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            collection: "todos".to_string(),
            endpoint: "http://esp32.local/api/todos".to_string(),
            request_timeout_secs: 5,
            max_attempts: 1,
            retry_delay_ms: 0,
            failure_history: 50,
        }
    }
}
