//! Application configuration models.

mod app;
mod cache;
mod relay;
mod server;
mod store;

pub use app::AppConfig;
pub use cache::CacheConfig;
pub use relay::RelayConfig;
pub use server::ServerConfig;
pub use store::StoreConfig;
