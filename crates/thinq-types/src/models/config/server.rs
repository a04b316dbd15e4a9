//! HTTP server configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    #[validate(length(min = 1_u64))]
    pub host: String,
    /// Port to listen on
    #[validate(range(min = 1_u16))]
    pub port: u16,
    /// Start the relay automatically after boot
    pub auto_start_relay: bool,
    /// Delay before the automatic start, in milliseconds
    #[validate(range(max = 60_000_u64))]
    pub auto_start_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            auto_start_relay: true,
            auto_start_delay_ms: 2000,
        }
    }
}
