//! # InnoFund Common Crate
//!
//! Shared foundation for the InnoFund backend: core identifiers, wei
//! amount handling, fee policy, the error taxonomy, TOML configuration
//! and the typed chain-event bus.
//!
//! ## Guarantees
//!
//! - **No IO in types**: everything here is pure data plus parsing.
//! - **Deterministic**: same input always produces the same output.
//! - **No panic**: all fallible paths return typed errors.

pub mod amount;
pub mod config;
pub mod error;
pub mod events;
pub mod fee;
pub mod receipt;
pub mod time;
pub mod types;
pub mod vote;

pub use amount::{format_wei, parse_wei, Amount, WEI_PER_TOKEN};
pub use config::{Config, GovernanceConfig, NetworkConfig};
pub use error::{
    FlowError, ReconcileError, StorageError, ValidationError, WalletError,
};
pub use events::{ChainEvent, EventBus, EventSubscription};
pub use fee::{FeeBreakdown, FeePolicy, DEFAULT_FEE_BPS};
pub use receipt::{OperationKind, Receipt, ReceiptPayload};
pub use time::unix_now;
pub use types::{Address, ChainId, ProjectId, ProposalId, TxHash};
pub use vote::{ReputationVote, VoteSupport};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
