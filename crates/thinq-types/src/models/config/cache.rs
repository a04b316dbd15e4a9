//! Read-through cache configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds; 0 disables caching
    #[validate(range(max = 86_400_u64))]
    pub ttl_secs: u64,
    /// Open todos scanned for today's titles
    #[validate(range(min = 1_usize, max = 1000_usize))]
    pub titles_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300, titles_limit: 20 }
    }
}
