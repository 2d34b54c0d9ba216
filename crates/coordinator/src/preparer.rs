//! Intent preparation.
//!
//! The preparer computes the authoritative transaction parameters for a
//! contribution or vote: validated amount, fee breakdown, calldata and
//! gas. It reads the mirror but never writes it, so preparing the same
//! request twice is free. The resulting [`Intent`] is consumed exactly
//! once by the executor and never persisted.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use innofund_chain::abi::{encode_cast_vote, encode_contribute};
use innofund_chain::call::{gas_with_buffer, ChainCall};
use innofund_common::amount::{parse_wei, Amount};
use innofund_common::config::Config;
use innofund_common::error::ValidationError;
use innofund_common::fee::{FeeBreakdown, FeePolicy};
use innofund_common::receipt::OperationKind;
use innofund_common::types::{Address, ChainId, HexParseError, ProjectId, ProposalId};
use innofund_common::vote::VoteSupport;
use innofund_ledger::{FundingLedger, GovernanceStore, ProposalState};

// ════════════════════════════════════════════════════════════════════════════
// INTENT
// ════════════════════════════════════════════════════════════════════════════

/// Business meaning of an intent, carried into the eventual receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntentAction {
    Contribute {
        project: ProjectId,
        fees: FeeBreakdown,
    },
    CastVote {
        proposal: ProposalId,
        support: VoteSupport,
    },
}

/// Unsigned, backend-validated description of a desired chain
/// operation. Created per request, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Intent {
    pub action: IntentAction,
    /// Parameters the wallet submits unchanged.
    pub call: ChainCall,
    /// Unix seconds at preparation.
    pub issued_at: u64,
}

impl Intent {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self.action {
            IntentAction::Contribute { .. } => OperationKind::Contribute,
            IntentAction::CastVote { .. } => OperationKind::CastVote,
        }
    }

    /// An intent not consumed within the TTL must be re-prepared,
    /// never submitted.
    #[must_use]
    pub fn is_stale(&self, now: u64, ttl_secs: u64) -> bool {
        now.saturating_sub(self.issued_at) > ttl_secs
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PREPARER
// ════════════════════════════════════════════════════════════════════════════

/// Computes intents against current mirror state.
pub struct IntentPreparer {
    funding: Arc<FundingLedger>,
    governance: Arc<GovernanceStore>,
    fees: FeePolicy,
    funding_contract: Address,
    dao_contract: Address,
    chain_id: ChainId,
    gas_fallback: u64,
}

impl IntentPreparer {
    /// Build from configuration. Fails if a contract address does not
    /// parse.
    pub fn from_config(
        config: &Config,
        funding: Arc<FundingLedger>,
        governance: Arc<GovernanceStore>,
    ) -> Result<Self, HexParseError> {
        Ok(Self {
            funding,
            governance,
            fees: FeePolicy::new(config.fee_bps),
            funding_contract: Address::from_hex(&config.network.funding_contract)?,
            dao_contract: Address::from_hex(&config.network.dao_contract)?,
            chain_id: ChainId(config.network.chain_id),
            gas_fallback: config.gas_fallback,
        })
    }

    /// Prepare a contribution intent.
    ///
    /// `raw_amount` is a decimal token string from the request body.
    /// Terminal rejections: malformed or zero amount, project inactive,
    /// funded or past its deadline.
    pub fn prepare_contribution(
        &self,
        project: ProjectId,
        raw_amount: &str,
        now: u64,
    ) -> Result<Intent, ValidationError> {
        let amount = parse_wei(raw_amount)
            .map_err(|e| ValidationError::InvalidAmount(e.to_string()))?;
        if amount == 0 {
            return Err(ValidationError::InvalidAmount(
                "amount must be greater than zero".to_string(),
            ));
        }
        self.funding.check_fundable(project, now)?;

        let fees = self.fees.breakdown(amount);
        debug!(
            project = %project,
            base = %fees.base_amount,
            fee = %fees.platform_fee,
            "contribution intent prepared"
        );
        Ok(Intent {
            call: ChainCall {
                to: self.funding_contract,
                data: encode_contribute(project),
                value: fees.total_amount,
                gas_limit: gas_with_buffer(None, self.gas_fallback),
                chain_id: self.chain_id,
            },
            action: IntentAction::Contribute { project, fees },
            issued_at: now,
        })
    }

    /// Prepare a governance vote intent. The proposal must exist and be
    /// Active after lazy evaluation at `now`.
    pub fn prepare_vote(
        &self,
        proposal: ProposalId,
        support: VoteSupport,
        now: u64,
    ) -> Result<Intent, ValidationError> {
        let view = self
            .governance
            .proposal(proposal, now)
            .ok_or_else(|| ValidationError::NotFound(format!("proposal {proposal}")))?;
        if view.state != ProposalState::Active {
            return Err(ValidationError::ProposalNotVotable(proposal));
        }

        debug!(proposal = %proposal, ?support, "vote intent prepared");
        Ok(Intent {
            call: ChainCall {
                to: self.dao_contract,
                data: encode_cast_vote(proposal, support),
                value: Amount(0),
                gas_limit: gas_with_buffer(None, self.gas_fallback),
                chain_id: self.chain_id,
            },
            action: IntentAction::CastVote { proposal, support },
            issued_at: now,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use innofund_common::amount::Amount;
    use innofund_common::config::GovernanceConfig;

    const NOW: u64 = 1_700_000_000;

    fn preparer() -> (IntentPreparer, ProjectId, ProposalId) {
        let funding = Arc::new(FundingLedger::new());
        let governance = Arc::new(GovernanceStore::new(GovernanceConfig {
            voting_delay_secs: 0,
            ..GovernanceConfig::default()
        }));
        let project = funding.create_project(Address([0x01; 20]), Amount(100), NOW + 86_400);
        let proposal = governance.create_proposal(project, NOW);
        let mut config = Config::default();
        config.fee_bps = 200;
        config.network.funding_contract =
            "0x1111111111111111111111111111111111111111".to_string();
        config.network.dao_contract = "0x2222222222222222222222222222222222222222".to_string();
        let preparer = IntentPreparer::from_config(&config, funding, governance).unwrap();
        (preparer, project, proposal)
    }

    #[test]
    fn test_contribution_intent_fee_math() {
        let (preparer, project, _) = preparer();
        let intent = preparer.prepare_contribution(project, "10", NOW).unwrap();
        match &intent.action {
            IntentAction::Contribute { fees, .. } => {
                // 10 tokens at 200 bps
                assert_eq!(fees.base_amount, Amount(10_000_000_000_000_000_000));
                assert_eq!(fees.platform_fee, Amount(200_000_000_000_000_000));
                assert_eq!(
                    fees.total_amount,
                    Amount(10_200_000_000_000_000_000)
                );
                assert_eq!(intent.call.value, fees.total_amount);
            }
            other => panic!("unexpected action: {other:?}"),
        }
        assert_eq!(intent.call.to, Address([0x11; 20]));
        assert_eq!(intent.call.gas_limit, 300_000);
    }

    #[test]
    fn test_invalid_amounts_rejected() {
        let (preparer, project, _) = preparer();
        for raw in ["0", "-1", "abc", "", "1.0000000000000000001"] {
            let err = preparer.prepare_contribution(project, raw, NOW).unwrap_err();
            assert!(matches!(err, ValidationError::InvalidAmount(_)), "{raw}");
        }
    }

    #[test]
    fn test_unfundable_project_rejected() {
        let (preparer, project, _) = preparer();
        let err = preparer
            .prepare_contribution(project, "1", NOW + 200_000)
            .unwrap_err();
        assert!(matches!(err, ValidationError::ProjectNotFundable { .. }));
    }

    #[test]
    fn test_vote_intent_targets_dao() {
        let (preparer, _, proposal) = preparer();
        let intent = preparer.prepare_vote(proposal, VoteSupport::For, NOW).unwrap();
        assert_eq!(intent.call.to, Address([0x22; 20]));
        assert_eq!(intent.call.value, Amount(0));
        assert_eq!(intent.kind(), OperationKind::CastVote);
    }

    #[test]
    fn test_vote_on_missing_or_closed_proposal() {
        let (preparer, _, proposal) = preparer();
        assert!(matches!(
            preparer.prepare_vote(ProposalId(99), VoteSupport::For, NOW),
            Err(ValidationError::NotFound(_))
        ));
        let after_close = NOW + 10_000_000;
        assert_eq!(
            preparer.prepare_vote(proposal, VoteSupport::For, after_close),
            Err(ValidationError::ProposalNotVotable(proposal))
        );
    }

    #[test]
    fn test_preparation_is_read_only() {
        let (preparer, project, _) = preparer();
        preparer.prepare_contribution(project, "5", NOW).unwrap();
        preparer.prepare_contribution(project, "5", NOW).unwrap();
        // repeated preparation leaves the mirror untouched
        assert_eq!(
            preparer.funding.project(project).unwrap().funds_raised,
            Amount(0)
        );
    }

    #[test]
    fn test_staleness_window() {
        let (preparer, project, _) = preparer();
        let intent = preparer.prepare_contribution(project, "1", NOW).unwrap();
        assert!(!intent.is_stale(NOW + 180, 180));
        assert!(intent.is_stale(NOW + 181, 180));
    }
}
