//! Chain provider abstraction.
//!
//! `ChainProvider` is the seam between the backend flow and whatever
//! actually signs and submits: an injected browser wallet in
//! production, [`crate::mock::MockProvider`] in tests. Implementations
//! map their native failure codes onto [`WalletError`] (4001 →
//! `UserRejected`, 4902 → `UnrecognizedChain`, revert →
//! `ExecutionFailed`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use innofund_common::error::WalletError;
use innofund_common::types::{Address, ChainId, TxHash};

use crate::call::ChainCall;
use crate::network::NetworkDescriptor;

// ════════════════════════════════════════════════════════════════════════════
// CHAIN RECEIPT
// ════════════════════════════════════════════════════════════════════════════

/// Wallet-reported confirmation of an included transaction. Carries no
/// business semantics; those are attached by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Unix timestamp at which the wallet reported inclusion.
    pub confirmed_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// PROVIDER TRAIT
// ════════════════════════════════════════════════════════════════════════════

/// Signing and submission capability of a connected wallet.
///
/// Every method may suspend for however long the user or the chain
/// takes; cancellation by the user resolves as an error, never a hang.
/// Implementations never retry on their own.
#[async_trait]
pub trait ChainProvider: Send + Sync {
    /// Chain the wallet is currently on.
    async fn chain_id(&self) -> Result<ChainId, WalletError>;

    /// In-place network switch. Fails with `UnrecognizedChain` when the
    /// wallet does not know the target.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), WalletError>;

    /// Register a network with the wallet so a switch can succeed.
    async fn add_chain(&self, descriptor: &NetworkDescriptor) -> Result<(), WalletError>;

    /// Accounts the wallet exposes; first entry is the active one.
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// Submit a prepared call and suspend until the chain includes the
    /// transaction. Exactly one of: a receipt, `UserRejected`, or
    /// `ExecutionFailed` with the underlying reason.
    async fn send_transaction(&self, call: &ChainCall) -> Result<ChainReceipt, WalletError>;
}
