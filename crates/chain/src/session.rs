//! Wallet session.
//!
//! Owns the provider handle and the expected network for the duration
//! of one user flow. Explicitly constructed by the caller and passed by
//! reference; re-initialization is a new `WalletSession`, never a
//! hidden singleton refresh.
//!
//! ## Network recovery
//!
//! `ensure_network` performs at most: one switch, one chain
//! registration, one retried switch. A second switch failure is
//! surfaced to the caller; there is no third attempt.

use std::sync::Arc;

use tracing::{debug, info, warn};

use innofund_common::error::WalletError;
use innofund_common::types::Address;

use crate::call::ChainCall;
use crate::network::NetworkDescriptor;
use crate::provider::{ChainProvider, ChainReceipt};

// ════════════════════════════════════════════════════════════════════════════
// WALLET SESSION
// ════════════════════════════════════════════════════════════════════════════

/// A caller-owned handle on the user's signing capability.
pub struct WalletSession {
    provider: Arc<dyn ChainProvider>,
    network: NetworkDescriptor,
}

impl WalletSession {
    #[must_use]
    pub fn new(provider: Arc<dyn ChainProvider>, network: NetworkDescriptor) -> Self {
        Self { provider, network }
    }

    #[must_use]
    pub fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    /// Make sure the wallet is on the expected chain.
    ///
    /// Unknown chain → register it once, then retry the switch once.
    pub async fn ensure_network(&self) -> Result<(), WalletError> {
        let expected = self.network.chain_id;
        if self.provider.chain_id().await? == expected {
            return Ok(());
        }

        match self.provider.switch_chain(expected).await {
            Ok(()) => Ok(()),
            Err(WalletError::UnrecognizedChain(_)) => {
                info!(chain = %expected, "wallet does not know the chain, registering it");
                self.provider.add_chain(&self.network).await?;
                self.provider.switch_chain(expected).await.map_err(|e| {
                    warn!(chain = %expected, error = %e, "network switch failed after registration");
                    e
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Active account of the wallet.
    pub async fn account(&self) -> Result<Address, WalletError> {
        let accounts = self.provider.request_accounts().await?;
        accounts
            .first()
            .copied()
            .ok_or_else(|| WalletError::Rpc("wallet returned no accounts".to_string()))
    }

    /// Submit a prepared call and suspend until inclusion.
    ///
    /// Never retried here: a rejected or failed submission requires a
    /// fresh Intent, because amounts and fees may have changed.
    pub async fn submit(&self, call: &ChainCall) -> Result<ChainReceipt, WalletError> {
        debug!(to = %call.to, value = %call.value, gas = call.gas_limit, "submitting transaction");
        let receipt = self.provider.send_transaction(call).await?;
        info!(tx = %receipt.tx_hash, block = receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockProvider, SubmitOutcome};
    use innofund_common::amount::Amount;
    use innofund_common::config::NetworkConfig;
    use innofund_common::types::ChainId;

    fn fuji() -> NetworkDescriptor {
        NetworkDescriptor::from_config(&NetworkConfig::default())
    }

    fn call() -> ChainCall {
        ChainCall {
            to: Address([0x01; 20]),
            data: vec![0x12, 0x34],
            value: Amount(10),
            gas_limit: 300_000,
            chain_id: ChainId(43113),
        }
    }

    #[tokio::test]
    async fn test_ensure_network_noop_when_on_chain() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(43113)));
        let session = WalletSession::new(provider.clone(), fuji());
        session.ensure_network().await.unwrap();
        assert_eq!(provider.switch_attempts(), 0);
    }

    #[tokio::test]
    async fn test_ensure_network_switches() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(1)));
        provider.know_chain(ChainId(43113));
        let session = WalletSession::new(provider.clone(), fuji());
        session.ensure_network().await.unwrap();
        assert_eq!(provider.switch_attempts(), 1);
        assert_eq!(provider.current_chain(), ChainId(43113));
    }

    #[tokio::test]
    async fn test_ensure_network_registers_unknown_chain_once() {
        // wallet on mainnet, Fuji unknown: switch -> add -> switch
        let provider = Arc::new(MockProvider::on_chain(ChainId(1)));
        let session = WalletSession::new(provider.clone(), fuji());
        session.ensure_network().await.unwrap();
        assert_eq!(provider.add_chain_calls(), 1);
        assert_eq!(provider.switch_attempts(), 2);
        assert_eq!(provider.current_chain(), ChainId(43113));
    }

    #[tokio::test]
    async fn test_ensure_network_no_third_attempt() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(1)));
        provider.fail_switch_always("user closed the dialog");
        let session = WalletSession::new(provider.clone(), fuji());
        let err = session.ensure_network().await.unwrap_err();
        assert!(matches!(err, WalletError::SwitchFailed(_)));
        // one failed switch, no registration path taken, no retries
        assert_eq!(provider.switch_attempts(), 1);
        assert_eq!(provider.add_chain_calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_network_registration_then_switch_failure_is_fatal() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(1)));
        provider.fail_switch_after_add("still refused");
        let session = WalletSession::new(provider.clone(), fuji());
        let err = session.ensure_network().await.unwrap_err();
        assert!(matches!(err, WalletError::SwitchFailed(_)));
        assert_eq!(provider.add_chain_calls(), 1);
        assert_eq!(provider.switch_attempts(), 2);
    }

    #[tokio::test]
    async fn test_account_returns_first() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(43113)));
        provider.set_accounts(vec![Address([0x0a; 20]), Address([0x0b; 20])]);
        let session = WalletSession::new(provider, fuji());
        assert_eq!(session.account().await.unwrap(), Address([0x0a; 20]));
    }

    #[tokio::test]
    async fn test_submit_confirms() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(43113)));
        let session = WalletSession::new(provider, fuji());
        let receipt = session.submit(&call()).await.unwrap();
        assert!(receipt.block_number > 0);
    }

    #[tokio::test]
    async fn test_submit_user_rejection() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(43113)));
        provider.set_submit_outcome(SubmitOutcome::Reject);
        let session = WalletSession::new(provider, fuji());
        assert_eq!(session.submit(&call()).await.unwrap_err(), WalletError::UserRejected);
    }

    #[tokio::test]
    async fn test_submit_revert_carries_reason() {
        let provider = Arc::new(MockProvider::on_chain(ChainId(43113)));
        provider.set_submit_outcome(SubmitOutcome::Revert("insufficient funds".to_string()));
        let session = WalletSession::new(provider, fuji());
        let err = session.submit(&call()).await.unwrap_err();
        assert_eq!(err, WalletError::ExecutionFailed { reason: "insufficient funds".to_string() });
    }
}
