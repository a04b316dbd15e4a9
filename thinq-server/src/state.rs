use std::sync::Arc;
use std::time::Instant;

use thinq_core::{
    ChangeFeedRelay, CharacterCatalog, DeviceTimer, DocumentStore, MemoryStore, PostgresStore,
    TodoService,
};
use thinq_types::{AppConfig, RelayError, StoreConfig};

#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<AppStateInner>,
}

pub struct AppStateInner {
    pub config: AppConfig,
    pub relay: ChangeFeedRelay,
    pub todos: TodoService,
    pub characters: CharacterCatalog,
    pub timer: DeviceTimer,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service to the same store. Fails only on a bad device endpoint.
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, RelayError> {
        let relay = ChangeFeedRelay::new(Arc::clone(&store), config.relay.clone())?;
        let todos = TodoService::new(Arc::clone(&store), config.relay.collection.clone(), &config.cache)
            .with_sessions_collection(config.store.sessions_collection.clone());
        let characters = CharacterCatalog::new(
            store,
            config.store.characters_collection.clone(),
            &config.cache,
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                relay,
                todos,
                characters,
                timer: DeviceTimer::new(),
                started_at: Instant::now(),
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn relay(&self) -> &ChangeFeedRelay {
        &self.inner.relay
    }

    pub fn todos(&self) -> &TodoService {
        &self.inner.todos
    }

    pub fn characters(&self) -> &CharacterCatalog {
        &self.inner.characters
    }

    pub fn timer(&self) -> &DeviceTimer {
        &self.inner.timer
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}

/// PostgreSQL when a database URL is configured, the in-memory store otherwise.
pub async fn connect_store(config: &StoreConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!("⚠️ No DATABASE_URL configured, using the in-memory store (data is lost on exit)");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let store = PostgresStore::connect(url, config.max_connections).await?;
    store.run_migrations().await?;
    tracing::info!("🗄️ Connected to PostgreSQL ({} max connections)", config.max_connections);
    Ok(Arc::new(store))
}
