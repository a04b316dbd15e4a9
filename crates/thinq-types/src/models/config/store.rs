//! Document store configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct StoreConfig {
    /// PostgreSQL URL; the in-memory store is used when unset
    pub database_url: Option<String>,
    #[validate(range(min = 1_u32, max = 100_u32))]
    pub max_connections: u32,
    /// Collection holding character records
    #[validate(length(min = 1_u64))]
    pub characters_collection: String,
    /// Collection holding completed work sessions
    #[validate(length(min = 1_u64))]
    pub sessions_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 5,
            characters_collection: "characters".to_string(),
            sessions_collection: "work_sessions".to_string(),
        }
    }
}
