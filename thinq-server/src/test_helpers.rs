//! Test helpers for thinq-server unit tests.

use std::sync::Arc;

use thinq_core::MemoryStore;
use thinq_types::{AppConfig, RelayConfig};

use crate::state::AppState;

/// `AppState` over a fresh in-memory store, relaying to `endpoint`.
///
/// The store is returned too so tests can seed and inspect documents.
pub fn test_app_state_with_endpoint(endpoint: &str) -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig {
        relay: RelayConfig {
            endpoint: endpoint.to_string(),
            request_timeout_secs: 2,
            ..RelayConfig::default()
        },
        ..AppConfig::default()
    };
    let state = AppState::new(config, store.clone()).expect("failed to create test AppState");
    (state, store)
}

/// Device endpoint points at a closed local port.
pub fn test_app_state() -> (AppState, Arc<MemoryStore>) {
    test_app_state_with_endpoint("http://127.0.0.1:9/api/todos")
}
