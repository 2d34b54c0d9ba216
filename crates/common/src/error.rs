//! Error taxonomy for the contribution and governance flow.
//!
//! Classes map to recovery behavior, not to modules:
//!
//! | class | recovery |
//! |-------|----------|
//! | `ValidationError` | fail fast, no retry |
//! | `WalletError` | surfaced to the user, retry needs a fresh user action |
//! | `FlowError::Execution` | chain reverted, never retry the same intent |
//! | `ReconcileError::Pending` | chain succeeded, mirror behind truth, MUST retry |
//! | `ReconcileError::DuplicateVote` | idempotent rejection, tally untouched |
//!
//! No error here terminates the process; everything is recoverable at
//! the scope of one operation.

use thiserror::Error;

use crate::types::{Address, ChainId, ProjectId, ProposalId, TxHash};

// ════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ════════════════════════════════════════════════════════════════════════════

/// Rejected before anything touches the chain. Terminal for the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("project {project} is not fundable: {reason}")]
    ProjectNotFundable { project: ProjectId, reason: String },

    #[error("proposal {0} is not open for voting")]
    ProposalNotVotable(ProposalId),

    #[error("{0} not found")]
    NotFound(String),

    /// An Intent older than the configured TTL must be re-prepared,
    /// never submitted: amounts and fees may have changed.
    #[error("intent is stale ({age_secs}s old, ttl {ttl_secs}s)")]
    StaleIntent { age_secs: u64, ttl_secs: u64 },
}

// ════════════════════════════════════════════════════════════════════════════
// WALLET
// ════════════════════════════════════════════════════════════════════════════

/// Failure at the wallet boundary. Retrying requires a fresh user
/// action and a fresh Intent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider available")]
    ProviderMissing,

    #[error("user rejected the request")]
    UserRejected,

    /// The wallet does not know the target chain (MetaMask error 4902).
    /// The session registers the chain once and retries the switch once.
    #[error("chain {0} not recognized by the wallet")]
    UnrecognizedChain(ChainId),

    #[error("network switch failed: {0}")]
    SwitchFailed(String),

    /// Chain-level failure reported through the wallet: reverted
    /// execution, insufficient funds. Carries the underlying reason.
    #[error("execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("wallet rpc error: {0}")]
    Rpc(String),
}

// ════════════════════════════════════════════════════════════════════════════
// STORAGE / RECONCILIATION
// ════════════════════════════════════════════════════════════════════════════

/// Failure of the backing mirror store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage corrupt: {0}")]
    Corrupt(String),
}

/// Failure applying a confirmed Receipt to the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// The (proposal, voter) pair already carries a vote. The tally is
    /// untouched. Distinct from the tx-hash idempotency no-op.
    #[error("address {voter} already voted on proposal {proposal}")]
    DuplicateVote { proposal: ProposalId, voter: Address },

    /// Votability is rechecked at reconcile time: the proposal may have
    /// closed between preparation and confirmation.
    #[error("proposal {0} is not open for voting")]
    ProposalNotVotable(ProposalId),

    #[error("project {0} not found in the mirror")]
    ProjectNotFound(ProjectId),

    #[error("proposal {0} not found in the mirror")]
    ProposalNotFound(ProposalId),

    /// The chain transaction succeeded but the mirror write failed.
    /// The mirror is now known to be behind truth; the caller MUST
    /// retry until it succeeds. Never swallow this.
    #[error("reconciliation of {tx_hash} pending: {source}")]
    Pending {
        tx_hash: TxHash,
        #[source]
        source: StorageError,
    },
}

impl ReconcileError {
    /// True when the receipt is committed on-chain and must be retried.
    #[must_use]
    pub fn must_retry(&self) -> bool {
        matches!(self, ReconcileError::Pending { .. })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FLOW
// ════════════════════════════════════════════════════════════════════════════

/// Unified error for a single user-initiated flow, as the executor and
/// the HTTP layer see it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Wallet(WalletError),

    /// The chain included and reverted the transaction. The Intent is
    /// discarded; a retry starts over from preparation.
    #[error("execution failed: {reason}")]
    Execution { reason: String },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl From<WalletError> for FlowError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::ExecutionFailed { reason } => FlowError::Execution { reason },
            other => FlowError::Wallet(other),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_failure_reclassified() {
        let e: FlowError = WalletError::ExecutionFailed { reason: "reverted".into() }.into();
        assert_eq!(e, FlowError::Execution { reason: "reverted".into() });
    }

    #[test]
    fn test_user_rejection_stays_wallet_class() {
        let e: FlowError = WalletError::UserRejected.into();
        assert_eq!(e, FlowError::Wallet(WalletError::UserRejected));
    }

    #[test]
    fn test_pending_must_retry() {
        let e = ReconcileError::Pending {
            tx_hash: TxHash([0u8; 32]),
            source: StorageError::Unavailable("down".into()),
        };
        assert!(e.must_retry());
        assert!(!ReconcileError::ProposalNotVotable(ProposalId(1)).must_retry());
    }
}
