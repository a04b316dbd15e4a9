//! Document store abstraction.
//!
//! Collection-scoped CRUD, filtered queries, all-or-nothing batch commits and
//! change subscriptions. Two adapters ship here: [`MemoryStore`] for tests and
//! local runs, [`PostgresStore`] for deployments.

mod memory;
mod pg;
mod pg_commit;
mod pg_helpers;
mod pg_listen;
mod subscription;


pub use memory::MemoryStore;
pub use pg::PostgresStore;
pub use subscription::{Subscription, SubscriptionSender};

use async_trait::async_trait;
use thinq_types::{Document, Fields, Filter, StoreError, WriteOp};
use uuid::Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of an [`DocumentStore::atomic_commit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Documents matched by each op, summed over the batch
    pub documents_written: usize,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open an ordered change stream for `collection`.
    ///
    /// The first batch (when the collection is non-empty) reports every
    /// existing document as `Added`.
    async fn subscribe(&self, collection: &str) -> StoreResult<Subscription>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Document>;

    /// Documents matching `filter`, ordered by id.
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Document>>;

    /// Apply every op or none of them. Commits are serialized per collection.
    async fn atomic_commit(&self, ops: Vec<WriteOp>) -> StoreResult<CommitSummary>;

    /// Create or replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document>;

    /// Merge `fields` into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> StoreResult<Document>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Create a document under a generated id.
    async fn create(&self, collection: &str, fields: Fields) -> StoreResult<Document> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(collection, &id, fields).await
    }
}
