//! TTL read-through cache.
//!
//! Best effort: no lock is held while the value is computed, so callers that
//! race on an expired key may both compute and the last writer wins.

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Cache entry with its computation time.
#[derive(Clone, Debug)]
struct CacheEntry<V> {
    value: V,
    computed_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self { value, computed_at: Instant::now() }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.computed_at.elapsed() < ttl
    }
}

pub struct TtlCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    /// Return the cached value when younger than `ttl`, otherwise run
    /// `compute` and store its result.
    ///
    /// A failed compute leaves the previous entry in place and returns the
    /// error. `ttl` of zero always computes and stores nothing.
    pub async fn get_or_compute<F, Fut, E>(&self, key: K, ttl: Duration, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if ttl.is_zero() {
            return compute().await;
        }

        if let Some(value) = self.fresh(&key, ttl) {
            tracing::debug!("[TtlCache] hit");
            return Ok(value);
        }

        let value = compute().await?;
        self.entries.insert(key, CacheEntry::new(value.clone()));
        Ok(value)
    }

    /// Cached value regardless of age.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // The shard guard must not live across an await.
    fn fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        let entry = self.entries.get(key)?;
        entry.is_fresh(ttl).then(|| entry.value.clone())
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
