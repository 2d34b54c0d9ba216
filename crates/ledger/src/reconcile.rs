//! Exactly-once reconciliation of confirmed receipts into the mirror.
//!
//! ## Guarantees
//!
//! - **Idempotent by tx hash**: a receipt already reconciled returns
//!   the stored prior result unchanged. No second mutation.
//! - **Never dropped**: a receipt whose mirror write fails enters the
//!   pending queue and is retried with backoff until it applies or the
//!   mirror rejects it. The chain transaction already happened; the
//!   mirror is behind truth until the write lands.
//! - **Terminal rejections are terminal**: a `DuplicateVote` or a
//!   closed voting window is not retried.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use innofund_common::error::ReconcileError;
use innofund_common::events::{ChainEvent, EventBus};
use innofund_common::receipt::{Receipt, ReceiptPayload};
use innofund_common::time::unix_now;
use innofund_common::types::TxHash;

use crate::store::{ApplyError, MirrorStore, ReconcileResult};

// ════════════════════════════════════════════════════════════════════════════
// PENDING RECEIPT
// ════════════════════════════════════════════════════════════════════════════

/// A confirmed receipt whose mirror write has not landed yet.
#[derive(Debug, Clone)]
pub struct PendingReceipt {
    pub receipt: Receipt,
    /// Unix seconds when the receipt entered the queue.
    pub added_at: u64,
    pub retry_count: u32,
    /// Unix seconds before which the next attempt is not due.
    pub next_attempt_at: u64,
}

/// Retry pacing for the pending queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Base delay before the first retry (seconds).
    pub retry_base_secs: u64,
    /// Ceiling for the exponential backoff (seconds).
    pub retry_max_secs: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            retry_base_secs: 1,
            retry_max_secs: 60,
        }
    }
}

impl ReconcilerConfig {
    /// Exponential backoff, capped. retry 0 → base, retry n → base·2ⁿ.
    #[must_use]
    pub fn backoff_secs(&self, retry_count: u32) -> u64 {
        self.retry_base_secs
            .saturating_mul(1u64 << retry_count.min(32))
            .min(self.retry_max_secs)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RECONCILER
// ════════════════════════════════════════════════════════════════════════════

/// Exactly-once applier of confirmed receipts.
pub struct Reconciler {
    store: Arc<dyn MirrorStore>,
    events: Arc<EventBus>,
    config: ReconcilerConfig,
    /// tx hash → stored prior result. The idempotency ledger.
    results: RwLock<HashMap<TxHash, ReconcileResult>>,
    pending: RwLock<Vec<PendingReceipt>>,
    reconciled_count: AtomicU64,
    duplicate_count: AtomicU64,
}

impl Reconciler {
    #[must_use]
    pub fn new(store: Arc<dyn MirrorStore>, events: Arc<EventBus>) -> Self {
        Self::with_config(store, events, ReconcilerConfig::default())
    }

    #[must_use]
    pub fn with_config(
        store: Arc<dyn MirrorStore>,
        events: Arc<EventBus>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            events,
            config,
            results: RwLock::new(HashMap::new()),
            pending: RwLock::new(Vec::new()),
            reconciled_count: AtomicU64::new(0),
            duplicate_count: AtomicU64::new(0),
        }
    }

    /// Reconcile one confirmed receipt at time `now`.
    ///
    /// Duplicate tx hashes return the stored result. A storage failure
    /// queues the receipt and surfaces `ReconcileError::Pending`; the
    /// retry loop owns it from there.
    pub fn reconcile(&self, receipt: &Receipt, now: u64) -> Result<ReconcileResult, ReconcileError> {
        // Check-then-apply runs under the results write lock: two
        // first-time calls for the same tx hash serialize here, so
        // only one of them reaches the mirror.
        let mut results = self.results.write();
        if let Some(prior) = results.get(&receipt.tx_hash) {
            self.duplicate_count.fetch_add(1, Ordering::Relaxed);
            debug!(tx = %receipt.tx_hash, "duplicate reconciliation, returning prior result");
            return Ok(prior.clone());
        }

        match self.store.apply(receipt, now) {
            Ok(result) => {
                self.commit(&mut results, receipt, result.clone());
                Ok(result)
            }
            Err(ApplyError::Rejected(e)) => {
                info!(tx = %receipt.tx_hash, error = %e, "mirror rejected receipt");
                Err(e)
            }
            Err(ApplyError::Storage(source)) => {
                self.enqueue_pending(receipt, now);
                Err(ReconcileError::Pending {
                    tx_hash: receipt.tx_hash,
                    source,
                })
            }
        }
    }

    /// Retry every due pending receipt once. Returns how many applied.
    pub fn retry_pending(&self, now: u64) -> usize {
        let due: Vec<PendingReceipt> = {
            let mut pending = self.pending.write();
            let mut due = Vec::new();
            let mut i = 0;
            while i < pending.len() {
                if pending[i].next_attempt_at <= now {
                    due.push(pending.swap_remove(i));
                } else {
                    i += 1;
                }
            }
            due
        };

        let mut applied = 0;
        for mut entry in due {
            // Same lock discipline as `reconcile`: a queued receipt
            // that a direct client retry already landed is dropped,
            // never re-applied.
            let mut results = self.results.write();
            if results.contains_key(&entry.receipt.tx_hash) {
                debug!(tx = %entry.receipt.tx_hash, "queued receipt already reconciled, dropping");
                continue;
            }
            match self.store.apply(&entry.receipt, now) {
                Ok(result) => {
                    self.commit(&mut results, &entry.receipt, result);
                    info!(
                        tx = %entry.receipt.tx_hash,
                        retries = entry.retry_count + 1,
                        "pending receipt reconciled"
                    );
                    applied += 1;
                }
                Err(ApplyError::Rejected(e)) => {
                    // terminal: the mirror will never accept it
                    warn!(tx = %entry.receipt.tx_hash, error = %e, "pending receipt rejected");
                }
                Err(ApplyError::Storage(e)) => {
                    entry.retry_count += 1;
                    entry.next_attempt_at = now + self.config.backoff_secs(entry.retry_count);
                    warn!(
                        tx = %entry.receipt.tx_hash,
                        retries = entry.retry_count,
                        error = %e,
                        "mirror still unavailable, receipt stays pending"
                    );
                    self.pending.write().push(entry);
                }
            }
        }
        applied
    }

    /// Drive `retry_pending` forever. Spawned by the server.
    pub async fn run_retry_loop(self: Arc<Self>) {
        let tick = std::time::Duration::from_secs(self.config.retry_base_secs.max(1));
        loop {
            tokio::time::sleep(tick).await;
            let applied = self.retry_pending(unix_now());
            if applied > 0 {
                info!(applied, remaining = self.pending_count(), "pending retry pass");
            }
        }
    }

    /// Stored result for a tx hash, if reconciled.
    #[must_use]
    pub fn result(&self, tx_hash: &TxHash) -> Option<ReconcileResult> {
        self.results.read().get(tx_hash).cloned()
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.read().len()
    }

    #[must_use]
    pub fn reconciled_count(&self) -> u64 {
        self.reconciled_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn duplicate_count(&self) -> u64 {
        self.duplicate_count.load(Ordering::Relaxed)
    }

    /// Record the result and publish events. The caller holds the
    /// results write lock, so insertion is atomic with its duplicate
    /// check. Any queued copy of the receipt is pruned.
    fn commit(
        &self,
        results: &mut HashMap<TxHash, ReconcileResult>,
        receipt: &Receipt,
        result: ReconcileResult,
    ) {
        match &result {
            ReconcileResult::Contribution {
                project,
                funds_raised,
                ..
            } => {
                self.events.publish(ChainEvent::Funded {
                    project_id: *project,
                    new_total: *funds_raised,
                });
            }
            ReconcileResult::Vote {
                proposal, support, ..
            } => {
                if let ReceiptPayload::CastVote { voter, .. } = &receipt.payload {
                    self.events.publish(ChainEvent::VoteCast {
                        proposal_id: *proposal,
                        voter: *voter,
                        support: *support,
                    });
                }
            }
        }
        results.insert(receipt.tx_hash, result);
        self.pending
            .write()
            .retain(|p| p.receipt.tx_hash != receipt.tx_hash);
        self.reconciled_count.fetch_add(1, Ordering::Relaxed);
        info!(tx = %receipt.tx_hash, "receipt reconciled");
    }

    fn enqueue_pending(&self, receipt: &Receipt, now: u64) {
        let mut pending = self.pending.write();
        if pending.iter().any(|p| p.receipt.tx_hash == receipt.tx_hash) {
            return;
        }
        pending.push(PendingReceipt {
            receipt: receipt.clone(),
            added_at: now,
            retry_count: 0,
            next_attempt_at: now + self.config.backoff_secs(0),
        });
        warn!(
            tx = %receipt.tx_hash,
            queued = pending.len(),
            "mirror write failed, receipt queued for retry"
        );
    }
}

// Shared between the HTTP handlers and the retry loop.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Reconciler>();
};

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
