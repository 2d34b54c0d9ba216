//! Transaction execution.
//!
//! Orchestrates one user-initiated flow end to end: prepare the intent,
//! put the wallet on the right network, submit, and attach the business
//! semantics to the chain receipt. No partial state survives a failure;
//! a retry starts over from preparation so amounts and fees are
//! re-validated against current conditions.

use tracing::info;

use innofund_chain::session::WalletSession;
use innofund_common::error::{FlowError, ValidationError};
use innofund_common::receipt::{Receipt, ReceiptPayload};
use innofund_common::time::unix_now;
use innofund_common::types::{ProjectId, ProposalId};
use innofund_common::vote::VoteSupport;

use crate::preparer::{Intent, IntentAction, IntentPreparer};

// ════════════════════════════════════════════════════════════════════════════
// EXECUTOR
// ════════════════════════════════════════════════════════════════════════════

/// Drives intents through the wallet into confirmed receipts.
pub struct TransactionExecutor {
    preparer: IntentPreparer,
    session: WalletSession,
    intent_ttl_secs: u64,
}

impl TransactionExecutor {
    #[must_use]
    pub fn new(preparer: IntentPreparer, session: WalletSession, intent_ttl_secs: u64) -> Self {
        Self {
            preparer,
            session,
            intent_ttl_secs,
        }
    }

    /// Prepare and execute a contribution.
    pub async fn execute_contribution(
        &self,
        project: ProjectId,
        raw_amount: &str,
    ) -> Result<Receipt, FlowError> {
        let now = unix_now();
        let intent = self.preparer.prepare_contribution(project, raw_amount, now)?;
        self.submit_intent(intent).await
    }

    /// Prepare and execute a governance vote.
    pub async fn execute_vote(
        &self,
        proposal: ProposalId,
        support: VoteSupport,
    ) -> Result<Receipt, FlowError> {
        let now = unix_now();
        let intent = self.preparer.prepare_vote(proposal, support, now)?;
        self.submit_intent(intent).await
    }

    /// Execute an already-prepared intent.
    ///
    /// The intent is consumed; on any failure the caller starts over
    /// from preparation. Staleness is checked immediately before
    /// submission, after the network suspension point.
    pub async fn submit_intent(&self, intent: Intent) -> Result<Receipt, FlowError> {
        self.session.ensure_network().await?;

        let now = unix_now();
        if intent.is_stale(now, self.intent_ttl_secs) {
            return Err(ValidationError::StaleIntent {
                age_secs: now.saturating_sub(intent.issued_at),
                ttl_secs: self.intent_ttl_secs,
            }
            .into());
        }

        let account = self.session.account().await?;
        let chain_receipt = self.session.submit(&intent.call).await?;

        let payload = match intent.action {
            IntentAction::Contribute { project, fees } => ReceiptPayload::Contribute {
                project,
                contributor: account,
                fees,
            },
            IntentAction::CastVote { proposal, support } => ReceiptPayload::CastVote {
                proposal,
                voter: account,
                support,
            },
        };
        info!(tx = %chain_receipt.tx_hash, kind = ?payload.kind(), "flow confirmed");
        Ok(Receipt {
            tx_hash: chain_receipt.tx_hash,
            payload,
            confirmed_at: chain_receipt.confirmed_at,
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
