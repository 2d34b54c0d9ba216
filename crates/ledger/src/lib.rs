//! # InnoFund Ledger Crate
//!
//! Backend mirror of on-chain truth: the funding ledger, the governance
//! proposal store, the reputation board and the reconciler that applies
//! confirmed receipts to them exactly once.
//!
//! ## Guarantees
//!
//! - **Exactly-once**: one mirror mutation per transaction hash.
//! - **Monotonic**: `funds_raised` never decreases.
//! - **Never dropped**: a confirmed receipt either applies, is
//!   terminally rejected, or waits in the pending queue.

pub mod funding;
pub mod governance;
pub mod reconcile;
pub mod reputation;
pub mod store;

pub use funding::{ContributionApplied, FundingLedger, Project, ProjectStatus};
pub use governance::{
    GovernanceStore, ProposalState, ProposalView, TransitionError, VoteApplied, VoteTally,
};
pub use reconcile::{PendingReceipt, Reconciler, ReconcilerConfig};
pub use reputation::{ReputationBoard, ReputationSummary};
pub use store::{ApplyError, FlakyStore, MemoryStore, MirrorStore, ReconcileResult};
