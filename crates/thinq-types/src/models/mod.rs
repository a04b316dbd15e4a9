//! Core domain models for ThinQ Bridge.
//!
//! This module contains all shared data structures used across the workspace.

mod change;
mod character;
mod config;
mod document;
mod relay;
mod session;
mod timer;
mod todo;

pub use change::{
    ChangeKind, ChangeRecord, DeliveryAction, DeliveryEnvelope, RelayDeliveryAttempt,
};
pub use character::{Character, NewCharacter, SelectableEntity, SELECTED_FIELD};
pub use config::{AppConfig, CacheConfig, RelayConfig, ServerConfig, StoreConfig};
pub use document::{DocRef, Document, Fields, Filter, WriteOp};
pub use relay::RelayStatus;
pub use session::{TodoCompletion, TodoProgressSummary, WorkSession};
pub use timer::{format_duration, TimerState};
pub use todo::{Todo, TodoProgressUpdate};
