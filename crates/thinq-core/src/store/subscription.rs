//! Channel-backed change subscriptions.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use thinq_types::{ChangeRecord, StoreError};
use tokio::sync::mpsc;

use super::StoreResult;

type Batch = StoreResult<Vec<ChangeRecord>>;

/// Ordered stream of change batches for one collection.
///
/// Dropping the subscription or calling [`Subscription::cancel`] stops
/// delivery; the producer notices through [`SubscriptionSender::is_closed`].
/// An `Err` item means the store side dropped the feed and nothing follows.
#[derive(Debug)]
pub struct Subscription {
    collection: String,
    rx: mpsc::UnboundedReceiver<Batch>,
}

/// Producer half held by a store adapter.
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
    tx: mpsc::UnboundedSender<Batch>,
}

impl Subscription {
    pub fn channel(collection: impl Into<String>) -> (SubscriptionSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SubscriptionSender { tx }, Self { collection: collection.into(), rx })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Stop delivery. Batches already queued can still be drained.
    pub fn cancel(&mut self) {
        self.rx.close();
    }
}

impl Stream for Subscription {
    type Item = Batch;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl SubscriptionSender {
    /// Returns `false` once the consumer is gone.
    pub fn send_batch(&self, batch: Vec<ChangeRecord>) -> bool {
        if batch.is_empty() {
            return !self.tx.is_closed();
        }
        self.tx.send(Ok(batch)).is_ok()
    }

    pub fn send_error(&self, error: StoreError) -> bool {
        self.tx.send(Err(error)).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the consumer drops or cancels.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_batches_arrive_in_order() {
        let (tx, mut sub) = Subscription::channel("todos");
        assert!(tx.send_batch(vec![ChangeRecord::removed("a", Utc::now())]));
        assert!(tx.send_batch(vec![ChangeRecord::removed("b", Utc::now())]));

        let first = sub.next().await.unwrap().unwrap();
        let second = sub.next().await.unwrap().unwrap();
        assert_eq!(first[0].entity_id, "a");
        assert_eq!(second[0].entity_id, "b");
    }

    #[tokio::test]
    async fn test_cancel_closes_producer() {
        let (tx, mut sub) = Subscription::channel("todos");
        assert!(!tx.is_closed());

        sub.cancel();
        assert!(tx.is_closed());
        assert!(!tx.send_batch(vec![ChangeRecord::removed("a", Utc::now())]));
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_resolves_closed() {
        let (tx, sub) = Subscription::channel("todos");
        drop(sub);
        tokio::time::timeout(std::time::Duration::from_secs(1), tx.closed()).await.unwrap();
    }
}
