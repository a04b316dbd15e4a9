//! Subscription lifecycle and per-record forwarding.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thinq_types::{
    ChangeRecord, DeliveryEnvelope, RelayConfig, RelayDeliveryAttempt, RelayError, RelayStatus,
    StoreError,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::bookkeeping::DeliveryLedger;
use super::forwarder::{DeviceForwarder, PingOutcome};
use crate::store::{DocumentStore, Subscription};

const PING_MESSAGE: &str = "Test from ThinQ Bridge";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    AlreadyListening,
}

enum RelayState {
    Stopped,
    Listening { shutdown_tx: watch::Sender<bool>, handle: JoinHandle<()> },
}

struct RelayInner {
    store: Arc<dyn DocumentStore>,
    forwarder: DeviceForwarder,
    config: RelayConfig,
    state: Mutex<RelayState>,
    ledger: DeliveryLedger,
    /// Bumped on every start so a finishing task only clears its own run.
    generation: AtomicU64,
}

/// Forwards one collection's change feed to the desk device.
///
/// Records are delivered strictly in arrival order with at most one request
/// in flight. `start`/`stop` may be called from any task.
#[derive(Clone)]
pub struct ChangeFeedRelay {
    inner: Arc<RelayInner>,
}

impl ChangeFeedRelay {
    pub fn new(store: Arc<dyn DocumentStore>, config: RelayConfig) -> Result<Self, RelayError> {
        let forwarder =
            DeviceForwarder::new(&config.endpoint, Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self {
            inner: Arc::new(RelayInner {
                store,
                forwarder,
                ledger: DeliveryLedger::new(config.failure_history),
                config,
                state: Mutex::new(RelayState::Stopped),
                generation: AtomicU64::new(0),
            }),
        })
    }

    /// Open the subscription and spawn the forwarding task.
    ///
    /// A failed subscription leaves the relay stopped and is returned as is.
    pub async fn start(&self) -> Result<StartOutcome, StoreError> {
        let mut state = self.inner.state.lock().await;
        if matches!(*state, RelayState::Listening { .. }) {
            if self.inner.ledger.is_listening() {
                return Ok(StartOutcome::AlreadyListening);
            }
            // The feed ended on its own (store drop); reap the exiting task first.
            if let RelayState::Listening { shutdown_tx, handle } =
                std::mem::replace(&mut *state, RelayState::Stopped)
            {
                let _ = shutdown_tx.send(true);
                if let Err(e) = handle.await {
                    tracing::warn!("Relay task ended abnormally: {}", e);
                }
            }
        }

        let collection = &self.inner.config.collection;
        let subscription = match self.inner.store.subscribe(collection).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::error!("❌ Failed to subscribe to '{}': {}", collection, e);
                self.inner.ledger.record_error(e.to_string());
                self.inner.ledger.mark_stopped();
                *state = RelayState::Stopped;
                return Err(e);
            },
        };

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.inner.ledger.mark_started();
        let handle =
            tokio::spawn(run_feed(Arc::clone(&self.inner), subscription, shutdown_rx, generation));
        *state = RelayState::Listening { shutdown_tx, handle };

        tracing::info!(
            "🎧 Relay listening on '{}' → {}",
            collection,
            self.inner.forwarder.endpoint()
        );
        Ok(StartOutcome::Started)
    }

    /// Cancel the subscription and wait for the task to finish its current
    /// record. Returns whether a live subscription was stopped.
    pub async fn stop(&self) -> bool {
        let mut state = self.inner.state.lock().await;
        let RelayState::Listening { shutdown_tx, handle } =
            std::mem::replace(&mut *state, RelayState::Stopped)
        else {
            return false;
        };

        let was_live = self.inner.ledger.is_listening();
        // Receiver gone means the task already exited.
        let _ = shutdown_tx.send(true);
        if let Err(e) = handle.await {
            tracing::warn!("Relay task ended abnormally: {}", e);
        }
        self.inner.ledger.mark_stopped();

        if was_live {
            tracing::info!("🛑 Relay stopped for '{}'", self.inner.config.collection);
        }
        was_live
    }

    pub fn is_listening(&self) -> bool {
        self.inner.ledger.is_listening()
    }

    pub fn status(&self) -> RelayStatus {
        self.inner.ledger.snapshot(&self.inner.config.collection, self.inner.forwarder.endpoint())
    }

    /// Connectivity check against the device endpoint.
    pub async fn ping(&self) -> Result<PingOutcome, RelayError> {
        self.inner.forwarder.ping(PING_MESSAGE).await
    }
}

async fn run_feed(
    inner: Arc<RelayInner>,
    mut subscription: Subscription,
    mut shutdown_rx: watch::Receiver<bool>,
    generation: u64,
) {
    'feed: loop {
        let next = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => break 'feed,
            next = subscription.next() => next,
        };

        match next {
            Some(Ok(batch)) => {
                inner.ledger.record_batch();
                tracing::debug!("Received {} change(s) on '{}'", batch.len(), subscription.collection());
                for change in batch {
                    if *shutdown_rx.borrow() {
                        break 'feed;
                    }
                    inner.deliver(change, &shutdown_rx).await;
                }
            },
            Some(Err(e)) => {
                tracing::error!("❌ Change feed for '{}' dropped: {}", subscription.collection(), e);
                inner.ledger.record_error(e.to_string());
                break 'feed;
            },
            None => {
                tracing::warn!("Change feed for '{}' closed by the store", subscription.collection());
                inner.ledger.record_error("change feed closed by the store");
                break 'feed;
            },
        }
    }

    subscription.cancel();
    if inner.generation.load(Ordering::SeqCst) == generation {
        inner.ledger.mark_stopped();
    }
}

impl RelayInner {
    async fn deliver(&self, change: ChangeRecord, shutdown_rx: &watch::Receiver<bool>) {
        self.ledger.record_processed();
        let envelope = DeliveryEnvelope::from_change(&change);
        let mut attempt = RelayDeliveryAttempt::new(change);
        let max_attempts = self.config.max_attempts.max(1);
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);

        while attempt.has_attempts_left(max_attempts) {
            if attempt.attempt_count > 0 {
                if *shutdown_rx.borrow() {
                    break;
                }
                if !retry_delay.is_zero() {
                    let mut shutdown = shutdown_rx.clone();
                    tokio::select! {
                        () = tokio::time::sleep(retry_delay) => {},
                        _ = shutdown.changed() => break,
                    }
                }
            }

            let n = attempt.begin_attempt();
            match self.forwarder.send(&envelope).await {
                Ok(()) => attempt.mark_delivered(),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ {} {} failed (attempt {}/{}): {}",
                        envelope.action.as_str(),
                        envelope.id,
                        n,
                        max_attempts,
                        e
                    );
                    let retryable = e.is_transient();
                    attempt.record_failure(&e);
                    if !retryable {
                        break;
                    }
                },
            }
        }

        if attempt.delivered {
            tracing::debug!("✅ Forwarded {} {}", envelope.action.as_str(), envelope.id);
            self.ledger.record_delivered();
        } else {
            tracing::error!(
                "❌ Giving up on {} {} after {} attempt(s): {}",
                envelope.action.as_str(),
                envelope.id,
                attempt.attempt_count,
                attempt.last_error.as_deref().unwrap_or("unknown error")
            );
            self.ledger.record_failure(attempt);
        }
    }
}
