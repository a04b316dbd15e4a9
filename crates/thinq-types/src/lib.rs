//! # ThinQ Types
//!
//! Core types, models, and error definitions for ThinQ Bridge.
//!
//! - **`error`** - Typed error hierarchy for the document store, the relay and configuration
//! - **`models`** - Domain models (documents, change records, characters, todos, timer, sessions, config)
//!
//! ## Architecture Role
//!
//! `thinq-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!            thinq-types (this crate)
//!                    │
//!                    ▼
//!               thinq-core
//!                    │
//!                    ▼
//!              thinq-server
//! ```

pub mod error;
pub mod models;

pub use error::{ConfigError, RelayError, StoreError};

pub use models::{
    AppConfig, CacheConfig, ChangeKind, ChangeRecord, Character, DeliveryAction,
    DeliveryEnvelope, DocRef, Document, Fields, Filter, NewCharacter, RelayConfig,
    RelayDeliveryAttempt, RelayStatus, SelectableEntity, ServerConfig, StoreConfig, TimerState,
    Todo, TodoCompletion, TodoProgressSummary, TodoProgressUpdate, WorkSession, WriteOp,
    SELECTED_FIELD,
};
