//! Relay counters and recent delivery failures.
#![allow(clippy::arithmetic_side_effects, reason = "atomic counter operations")]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thinq_types::{RelayDeliveryAttempt, RelayStatus};

#[derive(Default)]
struct LedgerState {
    started_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
    last_event_at: Option<DateTime<Utc>>,
    recent_failures: VecDeque<RelayDeliveryAttempt>,
}

pub(crate) struct DeliveryLedger {
    listening: AtomicBool,
    batches: AtomicU64,
    records: AtomicU64,
    delivered: AtomicU64,
    failed: AtomicU64,
    failure_history: usize,
    state: Mutex<LedgerState>,
}

impl DeliveryLedger {
    pub(crate) fn new(failure_history: usize) -> Self {
        Self {
            listening: AtomicBool::new(false),
            batches: AtomicU64::new(0),
            records: AtomicU64::new(0),
            delivered: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            failure_history,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub(crate) fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_started(&self) {
        self.state.lock().started_at = Some(Utc::now());
        self.listening.store(true, Ordering::SeqCst);
    }

    pub(crate) fn mark_stopped(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    pub(crate) fn record_batch(&self) {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.state.lock().last_event_at = Some(Utc::now());
    }

    pub(crate) fn record_processed(&self) {
        self.records.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn record_failure(&self, attempt: RelayDeliveryAttempt) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock();
        state.last_error.clone_from(&attempt.last_error);
        if self.failure_history == 0 {
            return;
        }
        if state.recent_failures.len() >= self.failure_history {
            state.recent_failures.pop_front();
        }
        state.recent_failures.push_back(attempt);
    }

    pub(crate) fn record_error(&self, message: impl Into<String>) {
        self.state.lock().last_error = Some(message.into());
    }

    pub(crate) fn snapshot(&self, collection: &str, endpoint: &str) -> RelayStatus {
        let state = self.state.lock();
        RelayStatus {
            listening: self.is_listening(),
            collection: collection.to_string(),
            endpoint: endpoint.to_string(),
            started_at: state.started_at,
            batches_received: self.batches.load(Ordering::SeqCst),
            records_processed: self.records.load(Ordering::SeqCst),
            delivered: self.delivered.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            last_error: state.last_error.clone(),
            last_event_at: state.last_event_at,
            recent_failures: state.recent_failures.iter().cloned().collect(),
        }
    }
}
