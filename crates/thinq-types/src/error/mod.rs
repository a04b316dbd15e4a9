//! Typed error definitions for ThinQ Bridge.
//!
//! Every domain error is serializable so it can travel into relay status
//! snapshots unchanged.

mod config;
mod relay;
mod store;

pub use config::ConfigError;
pub use relay::RelayError;
pub use store::StoreError;
