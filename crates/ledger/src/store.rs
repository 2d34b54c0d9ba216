//! Mirror persistence seam.
//!
//! The reconciler writes through [`MirrorStore`] so the persistence
//! layer can fail independently of the domain logic. A storage failure
//! means the write never happened and must be retried; a domain
//! rejection means the mirror examined the receipt and will never
//! accept it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use innofund_common::amount::Amount;
use innofund_common::error::{ReconcileError, StorageError};
use innofund_common::receipt::{Receipt, ReceiptPayload};
use innofund_common::types::{ProjectId, ProposalId};
use innofund_common::vote::VoteSupport;

use crate::funding::FundingLedger;
use crate::governance::{GovernanceStore, ProposalState, VoteTally};

// ════════════════════════════════════════════════════════════════════════════
// RESULTS AND ERRORS
// ════════════════════════════════════════════════════════════════════════════

/// What a reconciled receipt did to the mirror. Stored per tx hash and
/// returned unchanged for duplicate reconciliations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileResult {
    Contribution {
        project: ProjectId,
        funds_raised: Amount,
        platform_fees_collected: Amount,
        funded: bool,
        /// True only for the receipt that crossed the goal.
        newly_funded: bool,
    },
    Vote {
        proposal: ProposalId,
        support: VoteSupport,
        state: ProposalState,
        tally: VoteTally,
    },
}

/// Failure applying a receipt through the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The write never reached the mirror. Retryable.
    #[error(transparent)]
    Storage(StorageError),

    /// The mirror rejected the receipt. Terminal.
    #[error(transparent)]
    Rejected(ReconcileError),
}

// ════════════════════════════════════════════════════════════════════════════
// MIRROR STORE
// ════════════════════════════════════════════════════════════════════════════

/// Write path from confirmed receipts into the mirror.
pub trait MirrorStore: Send + Sync {
    /// Apply one confirmed receipt at time `now`.
    fn apply(&self, receipt: &Receipt, now: u64) -> Result<ReconcileResult, ApplyError>;
}

/// In-memory store over the funding ledger and governance store.
pub struct MemoryStore {
    funding: Arc<FundingLedger>,
    governance: Arc<GovernanceStore>,
}

impl MemoryStore {
    #[must_use]
    pub fn new(funding: Arc<FundingLedger>, governance: Arc<GovernanceStore>) -> Self {
        Self {
            funding,
            governance,
        }
    }
}

impl MirrorStore for MemoryStore {
    fn apply(&self, receipt: &Receipt, now: u64) -> Result<ReconcileResult, ApplyError> {
        match &receipt.payload {
            ReceiptPayload::Contribute { project, fees, .. } => {
                let applied = self
                    .funding
                    .apply_contribution(*project, fees)
                    .map_err(ApplyError::Rejected)?;
                Ok(ReconcileResult::Contribution {
                    project: *project,
                    funds_raised: applied.funds_raised,
                    platform_fees_collected: applied.platform_fees_collected,
                    funded: applied.funded,
                    newly_funded: applied.newly_funded,
                })
            }
            ReceiptPayload::CastVote {
                proposal,
                voter,
                support,
            } => {
                let applied = self
                    .governance
                    .cast_vote(*proposal, *voter, *support, now)
                    .map_err(ApplyError::Rejected)?;
                Ok(ReconcileResult::Vote {
                    proposal: *proposal,
                    support: *support,
                    state: applied.state,
                    tally: applied.tally,
                })
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FLAKY STORE
// ════════════════════════════════════════════════════════════════════════════

/// Test double that fails the first N applies with a storage error,
/// then delegates. Drives the pending-retry path.
pub struct FlakyStore<S> {
    inner: S,
    failures_left: AtomicU64,
    attempts: AtomicU64,
}

impl<S: MirrorStore> FlakyStore<S> {
    #[must_use]
    pub fn new(inner: S, failures: u64) -> Self {
        Self {
            inner,
            failures_left: AtomicU64::new(failures),
            attempts: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl<S: MirrorStore> MirrorStore for FlakyStore<S> {
    fn apply(&self, receipt: &Receipt, now: u64) -> Result<ReconcileResult, ApplyError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        let left = self.failures_left.load(Ordering::Relaxed);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::Relaxed);
            return Err(ApplyError::Storage(StorageError::Unavailable(
                "mirror store offline".to_string(),
            )));
        }
        self.inner.apply(receipt, now)
    }
}

// Stores are shared across the server and the retry loop.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MemoryStore>();
    assert_send_sync::<FlakyStore<MemoryStore>>();
};
