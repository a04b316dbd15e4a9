//! # ThinQ Core
//!
//! Business logic for ThinQ Bridge.
//!
//! ```text
//! thinq-core/src/
//! ├── store/        # DocumentStore trait, in-memory and PostgreSQL adapters
//! ├── relay/        # change-feed relay to the desk device
//! ├── selection/    # exclusive "is_selected" transitions
//! ├── cache.rs      # TTL read-through cache
//! ├── todos.rs      # device-facing todo reads, progress updates, work sessions
//! ├── timer.rs      # device focus timer state
//! ├── characters.rs # character catalog and selected image
//! ├── config.rs     # config file load/save
//! └── http.rs       # outbound HTTP client
//! ```

#![allow(
    clippy::significant_drop_tightening,
    reason = "Mutex guards in async code require careful lifetime management"
)]
#![allow(clippy::map_err_ignore, reason = "Error context is provided in the replacement message")]
#![cfg_attr(
    test,
    allow(
        clippy::panic,
        clippy::float_cmp,
        clippy::needless_collect,
        clippy::assertions_on_result_states
    )
)]

pub mod cache;
pub mod characters;
pub mod config;
pub mod error;
pub mod http;
pub mod relay;
pub mod selection;
pub mod store;
pub mod timer;
pub mod todos;

pub use cache::TtlCache;
pub use characters::CharacterCatalog;
pub use error::{AppError, AppResult};
pub use relay::{ChangeFeedRelay, DeviceForwarder, PingOutcome, StartOutcome};
pub use selection::ExclusiveSelectionService;
pub use store::{DocumentStore, MemoryStore, PostgresStore, StoreResult, Subscription};
pub use timer::DeviceTimer;
pub use todos::TodoService;
