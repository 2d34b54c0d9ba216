//! Confirmed-operation receipts.
//!
//! A [`Receipt`] is the result of a chain operation the wallet reported
//! as included. It carries the business semantics copied from the
//! originating Intent (the chain receipt alone has none) and is keyed
//! by `tx_hash`, the idempotency key for reconciliation.
//!
//! Receipts are immutable once built. A receipt that fails to apply to
//! the mirror is persisted in the pending queue, never dropped: the
//! chain transaction already happened.

use serde::{Deserialize, Serialize};

use crate::fee::FeeBreakdown;
use crate::types::{Address, ProjectId, ProposalId, TxHash};
use crate::vote::VoteSupport;

// ════════════════════════════════════════════════════════════════════════════
// OPERATION KIND
// ════════════════════════════════════════════════════════════════════════════

/// The two chain operations this flow reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Contribute,
    CastVote,
}

// ════════════════════════════════════════════════════════════════════════════
// RECEIPT
// ════════════════════════════════════════════════════════════════════════════

/// Business payload of a confirmed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReceiptPayload {
    Contribute {
        project: ProjectId,
        contributor: Address,
        fees: FeeBreakdown,
    },
    CastVote {
        proposal: ProposalId,
        voter: Address,
        support: VoteSupport,
    },
}

impl ReceiptPayload {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            ReceiptPayload::Contribute { .. } => OperationKind::Contribute,
            ReceiptPayload::CastVote { .. } => OperationKind::CastVote,
        }
    }
}

/// Confirmed result of a chain operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique chain transaction hash; reconciliation idempotency key.
    pub tx_hash: TxHash,
    /// Business semantics copied from the originating Intent.
    pub payload: ReceiptPayload,
    /// Unix timestamp of wallet-reported confirmation.
    pub confirmed_at: u64,
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;

    #[test]
    fn test_payload_kind() {
        let p = ReceiptPayload::CastVote {
            proposal: ProposalId(1),
            voter: Address::ZERO,
            support: VoteSupport::For,
        };
        assert_eq!(p.kind(), OperationKind::CastVote);
    }

    #[test]
    fn test_receipt_json_shape() {
        let r = Receipt {
            tx_hash: TxHash([0x22; 32]),
            payload: ReceiptPayload::Contribute {
                project: ProjectId(3),
                contributor: Address([0x11; 20]),
                fees: FeeBreakdown {
                    base_amount: Amount(10),
                    platform_fee: Amount(1),
                    total_amount: Amount(11),
                },
            },
            confirmed_at: 1_700_000_000,
        };
        let v: serde_json::Value = serde_json::to_value(&r).unwrap();
        assert_eq!(v["payload"]["kind"], "contribute");
        assert_eq!(v["payload"]["project"], 3);
        let back: Receipt = serde_json::from_value(v).unwrap();
        assert_eq!(back, r);
    }
}
