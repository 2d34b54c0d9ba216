//! In-memory provider for tests and local development.
//!
//! Scriptable per-call: tests choose the wallet's starting chain, the
//! chains it already knows, and the outcome of the next submission.
//! Every mutating call is counted so tests can assert exactly how many
//! attempts a flow made.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use sha3::{Digest, Keccak256};

use innofund_common::error::WalletError;
use innofund_common::types::{Address, ChainId, TxHash};

use crate::call::ChainCall;
use crate::network::NetworkDescriptor;
use crate::provider::{ChainProvider, ChainReceipt};

// ════════════════════════════════════════════════════════════════════════════
// SCRIPTED OUTCOMES
// ════════════════════════════════════════════════════════════════════════════

/// What the next `send_transaction` call does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Confirm at the next block height with a deterministic tx hash.
    Confirm,
    /// User dismisses the wallet prompt (MetaMask code 4001).
    Reject,
    /// Chain includes and reverts the transaction with this reason.
    Revert(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SwitchScript {
    Normal,
    AlwaysFail,
    FailAfterAdd,
}

// ════════════════════════════════════════════════════════════════════════════
// MOCK PROVIDER
// ════════════════════════════════════════════════════════════════════════════

pub struct MockProvider {
    current_chain: RwLock<ChainId>,
    known_chains: RwLock<Vec<ChainId>>,
    accounts: RwLock<Vec<Address>>,
    submit_outcome: RwLock<SubmitOutcome>,
    switch_script: RwLock<(SwitchScript, String)>,
    switch_attempts: AtomicU64,
    add_chain_calls: AtomicU64,
    submitted: RwLock<Vec<ChainCall>>,
    next_block: AtomicU64,
}

impl MockProvider {
    /// A wallet currently connected to `chain`, which is the only chain
    /// it knows.
    #[must_use]
    pub fn on_chain(chain: ChainId) -> Self {
        Self {
            current_chain: RwLock::new(chain),
            known_chains: RwLock::new(vec![chain]),
            accounts: RwLock::new(vec![Address([0xaa; 20])]),
            submit_outcome: RwLock::new(SubmitOutcome::Confirm),
            switch_script: RwLock::new((SwitchScript::Normal, String::new())),
            switch_attempts: AtomicU64::new(0),
            add_chain_calls: AtomicU64::new(0),
            submitted: RwLock::new(Vec::new()),
            next_block: AtomicU64::new(1),
        }
    }

    pub fn know_chain(&self, chain: ChainId) {
        self.known_chains.write().push(chain);
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        *self.accounts.write() = accounts;
    }

    pub fn set_submit_outcome(&self, outcome: SubmitOutcome) {
        *self.submit_outcome.write() = outcome;
    }

    /// Every switch attempt fails, with or without registration.
    pub fn fail_switch_always(&self, reason: &str) {
        *self.switch_script.write() = (SwitchScript::AlwaysFail, reason.to_string());
    }

    /// The chain is unknown, registration succeeds, but the retried
    /// switch still fails.
    pub fn fail_switch_after_add(&self, reason: &str) {
        *self.switch_script.write() = (SwitchScript::FailAfterAdd, reason.to_string());
    }

    #[must_use]
    pub fn switch_attempts(&self) -> u64 {
        self.switch_attempts.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn add_chain_calls(&self) -> u64 {
        self.add_chain_calls.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn current_chain(&self) -> ChainId {
        *self.current_chain.read()
    }

    /// Calls that reached the chain, in submission order.
    #[must_use]
    pub fn submitted(&self) -> Vec<ChainCall> {
        self.submitted.read().clone()
    }

    fn tx_hash_for(call: &ChainCall, block: u64) -> TxHash {
        let mut hasher = Keccak256::new();
        hasher.update(call.to.0);
        hasher.update(&call.data);
        hasher.update(call.value.0.to_be_bytes());
        hasher.update(block.to_be_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        TxHash(out)
    }
}

#[async_trait]
impl ChainProvider for MockProvider {
    async fn chain_id(&self) -> Result<ChainId, WalletError> {
        Ok(*self.current_chain.read())
    }

    async fn switch_chain(&self, chain: ChainId) -> Result<(), WalletError> {
        self.switch_attempts.fetch_add(1, Ordering::Relaxed);
        let (script, reason) = self.switch_script.read().clone();
        match script {
            SwitchScript::AlwaysFail => return Err(WalletError::SwitchFailed(reason)),
            SwitchScript::FailAfterAdd => {
                if self.add_chain_calls.load(Ordering::Relaxed) > 0 {
                    return Err(WalletError::SwitchFailed(reason));
                }
                return Err(WalletError::UnrecognizedChain(chain));
            }
            SwitchScript::Normal => {}
        }
        if !self.known_chains.read().contains(&chain) {
            return Err(WalletError::UnrecognizedChain(chain));
        }
        *self.current_chain.write() = chain;
        Ok(())
    }

    async fn add_chain(&self, network: &NetworkDescriptor) -> Result<(), WalletError> {
        self.add_chain_calls.fetch_add(1, Ordering::Relaxed);
        self.known_chains.write().push(network.chain_id);
        Ok(())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(self.accounts.read().clone())
    }

    async fn send_transaction(&self, call: &ChainCall) -> Result<ChainReceipt, WalletError> {
        match self.submit_outcome.read().clone() {
            SubmitOutcome::Reject => return Err(WalletError::UserRejected),
            SubmitOutcome::Revert(reason) => {
                return Err(WalletError::ExecutionFailed { reason });
            }
            SubmitOutcome::Confirm => {}
        }
        self.submitted.write().push(call.clone());
        let block = self.next_block.fetch_add(1, Ordering::Relaxed);
        Ok(ChainReceipt {
            tx_hash: Self::tx_hash_for(call, block),
            block_number: block,
            confirmed_at: 1_700_000_000 + block,
        })
    }
}

// Compile-time check that the mock can be shared across tasks.
const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<MockProvider>();
};

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use innofund_common::amount::Amount;

    fn call(value: u128) -> ChainCall {
        ChainCall {
            to: Address([0x02; 20]),
            data: vec![0xde, 0xad],
            value: Amount(value),
            gas_limit: 100_000,
            chain_id: ChainId(43113),
        }
    }

    #[tokio::test]
    async fn test_switch_to_unknown_chain_reports_unrecognized() {
        let provider = MockProvider::on_chain(ChainId(1));
        let err = provider.switch_chain(ChainId(43113)).await.unwrap_err();
        assert_eq!(err, WalletError::UnrecognizedChain(ChainId(43113)));
    }

    #[tokio::test]
    async fn test_add_then_switch() {
        let provider = MockProvider::on_chain(ChainId(1));
        let network =
            NetworkDescriptor::from_config(&innofund_common::config::NetworkConfig::default());
        provider.add_chain(&network).await.unwrap();
        provider.switch_chain(ChainId(43113)).await.unwrap();
        assert_eq!(provider.current_chain(), ChainId(43113));
    }

    #[tokio::test]
    async fn test_tx_hash_deterministic_per_block() {
        let provider = MockProvider::on_chain(ChainId(43113));
        let a = provider.send_transaction(&call(5)).await.unwrap();
        let b = provider.send_transaction(&call(5)).await.unwrap();
        // identical call at a later block still gets a fresh hash
        assert_ne!(a.tx_hash, b.tx_hash);
        assert_eq!(b.block_number, a.block_number + 1);
    }

    #[tokio::test]
    async fn test_rejection_records_nothing() {
        let provider = MockProvider::on_chain(ChainId(43113));
        provider.set_submit_outcome(SubmitOutcome::Reject);
        let _ = provider.send_transaction(&call(1)).await;
        assert!(provider.submitted().is_empty());
    }
}
