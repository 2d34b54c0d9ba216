//! Platform fee policy.
//!
//! Fees are expressed in basis points and computed once, by the Intent
//! Preparer, in integer wei math with floor rounding. The resulting
//! `FeeBreakdown` is immutable for the lifetime of the operation.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;

/// Default platform fee: 50 bps = 0.5% of the contribution.
pub const DEFAULT_FEE_BPS: u32 = 50;

const BPS_DENOMINATOR: u128 = 10_000;

// ════════════════════════════════════════════════════════════════════════════
// FEE POLICY
// ════════════════════════════════════════════════════════════════════════════

/// Platform fee configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePolicy {
    /// Fee rate in basis points (1 bps = 0.01%).
    pub fee_bps: u32,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self { fee_bps: DEFAULT_FEE_BPS }
    }
}

impl FeePolicy {
    #[must_use]
    pub fn new(fee_bps: u32) -> Self {
        Self { fee_bps }
    }

    /// Compute the fee breakdown for a contribution of `base` wei.
    ///
    /// `platform_fee = base * fee_bps / 10_000` with floor rounding.
    /// The multiplication is split so it cannot overflow u128 for any
    /// representable amount.
    #[must_use]
    pub fn breakdown(&self, base: u128) -> FeeBreakdown {
        let bps = self.fee_bps as u128;
        let fee = (base / BPS_DENOMINATOR) * bps + (base % BPS_DENOMINATOR) * bps / BPS_DENOMINATOR;
        FeeBreakdown {
            base_amount: Amount(base),
            platform_fee: Amount(fee),
            total_amount: Amount(base.saturating_add(fee)),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FEE BREAKDOWN
// ════════════════════════════════════════════════════════════════════════════

/// Fee split for a single contribution. Computed once by the Intent
/// Preparer; immutable thereafter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Amount credited to the project.
    pub base_amount: Amount,
    /// Amount collected by the platform.
    pub platform_fee: Amount,
    /// Amount the wallet must attach to the transaction.
    pub total_amount: Amount,
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
