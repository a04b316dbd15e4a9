//! In-memory document store.
//!
//! One mutex covers every collection, so each operation (an atomic commit
//! included) is applied and published to subscribers as a single step.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thinq_types::{ChangeRecord, Document, Fields, Filter, StoreError, WriteOp};

use super::{CommitSummary, DocumentStore, StoreResult, Subscription, SubscriptionSender};

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<String, BTreeMap<String, Document>>,
    subscribers: HashMap<String, Vec<SubscriptionSender>>,
    unavailable: bool,
    last_observed: Option<DateTime<Utc>>,
}

impl MemoryInner {
    fn ensure_available(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::unavailable("memory store is offline"));
        }
        Ok(())
    }

    /// Wall clock, clamped so it never runs backwards.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = match self.last_observed {
            Some(last) if last > Utc::now() => last,
            _ => Utc::now(),
        };
        self.last_observed = Some(now);
        now
    }

    fn publish(&mut self, collection: &str, batch: Vec<ChangeRecord>) {
        if batch.is_empty() {
            return;
        }
        if let Some(senders) = self.subscribers.get_mut(collection) {
            senders.retain(|sender| sender.send_batch(batch.clone()));
        }
    }
}

/// Merge `patch` into `fields`; returns whether anything changed.
fn merge_fields(fields: &mut Fields, patch: &Fields) -> bool {
    let mut changed = false;
    for (key, value) in patch {
        if fields.get(key) != Some(value) {
            fields.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

/// Process-local [`DocumentStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every operation fails with `Unavailable` while set.
    pub fn set_available(&self, available: bool) {
        self.inner.lock().unavailable = !available;
    }

    /// Drop every subscription on `collection`, reporting `Unavailable` first.
    pub fn disconnect_subscribers(&self, collection: &str) {
        let senders = self.inner.lock().subscribers.remove(collection).unwrap_or_default();
        for sender in senders {
            sender.send_error(StoreError::unavailable(format!(
                "subscription to '{}' was dropped",
                collection
            )));
        }
    }

    pub fn subscriber_count(&self, collection: &str) -> usize {
        let mut inner = self.inner.lock();
        match inner.subscribers.get_mut(collection) {
            Some(senders) => {
                senders.retain(|sender| !sender.is_closed());
                senders.len()
            },
            None => 0,
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription> {
        let mut inner = self.inner.lock();
        inner.ensure_available()?;

        let (sender, subscription) = Subscription::channel(collection);
        let observed_at = inner.tick();
        let snapshot: Vec<ChangeRecord> = inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .map(|doc| ChangeRecord::added(doc.id.clone(), doc.fields.clone(), observed_at))
                    .collect()
            })
            .unwrap_or_default();
        sender.send_batch(snapshot);

        inner.subscribers.entry(collection.to_string()).or_default().push(sender);
        Ok(subscription)
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document> {
        let inner = self.inner.lock();
        inner.ensure_available()?;
        inner
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection, id))
    }

    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>> {
        let inner = self.inner.lock();
        inner.ensure_available()?;
        let Some(docs) = inner.collections.get(collection) else {
            return Ok(Vec::new());
        };
        Ok(docs
            .values()
            .filter(|doc| filter.matches(&doc.fields))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn atomic_commit(&self, ops: Vec<WriteOp>) -> StoreResult<CommitSummary> {
        let mut inner = self.inner.lock();
        inner.ensure_available()?;

        for op in &ops {
            if let WriteOp::Update { target, .. } = op {
                let exists = inner
                    .collections
                    .get(&target.collection)
                    .is_some_and(|docs| docs.contains_key(&target.id));
                if !exists {
                    return Err(StoreError::not_found(&target.collection, &target.id));
                }
            }
        }

        let now = inner.tick();
        let mut summary = CommitSummary::default();
        // collection -> id -> fields before the first op touched the document
        let mut originals: BTreeMap<String, BTreeMap<String, Fields>> = BTreeMap::new();

        for op in &ops {
            let collection = op.collection().to_string();
            let docs = inner.collections.entry(collection.clone()).or_default();
            let mut touch = |doc: &mut Document, patch: &Fields| {
                summary.documents_written += 1;
                originals
                    .entry(collection.clone())
                    .or_default()
                    .entry(doc.id.clone())
                    .or_insert_with(|| doc.fields.clone());
                merge_fields(&mut doc.fields, patch);
            };
            match op {
                WriteOp::Update { target, fields } => {
                    if let Some(doc) = docs.get_mut(&target.id) {
                        touch(doc, fields);
                    }
                },
                WriteOp::UpdateWhere { filter, fields, .. } => {
                    for doc in docs.values_mut().filter(|doc| filter.matches(&doc.fields)) {
                        touch(doc, fields);
                    }
                },
            }
        }

        // Only documents whose final fields differ from their pre-commit state
        // count as modified; a clear-then-set of the same flag is a no-op.
        for (collection, touched) in originals {
            let mut batch = Vec::new();
            if let Some(docs) = inner.collections.get_mut(&collection) {
                for (id, before) in touched {
                    if let Some(doc) = docs.get_mut(&id) {
                        if doc.fields != before {
                            doc.updated_at = now;
                            batch.push(ChangeRecord::modified(id, doc.fields.clone(), now));
                        }
                    }
                }
            }
            inner.publish(&collection, batch);
        }
        Ok(summary)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let mut inner = self.inner.lock();
        inner.ensure_available()?;
        let now = inner.tick();

        let doc = Document {
            id: id.to_string(),
            collection: collection.to_string(),
            fields,
            updated_at: now,
        };
        let previous = inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());

        let record = match previous {
            None => Some(ChangeRecord::added(id, doc.fields.clone(), now)),
            Some(old) if old.fields != doc.fields => {
                Some(ChangeRecord::modified(id, doc.fields.clone(), now))
            },
            Some(_) => None,
        };
        inner.publish(collection, record.into_iter().collect());
        Ok(doc)
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document> {
        let mut inner = self.inner.lock();
        inner.ensure_available()?;
        let now = inner.tick();

        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let changed = merge_fields(&mut doc.fields, &fields);
        if changed {
            doc.updated_at = now;
        }
        let doc = doc.clone();

        if changed {
            inner.publish(collection, vec![ChangeRecord::modified(id, doc.fields.clone(), now)]);
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.ensure_available()?;
        let now = inner.tick();

        inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.remove(id))
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        inner.publish(collection, vec![ChangeRecord::removed(id, now)]);
        Ok(())
    }
}
