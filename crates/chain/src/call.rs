//! Prepared chain call.
//!
//! A `ChainCall` is the opaque submission payload of an Intent: target
//! contract, calldata, attached value, gas and chain id. The wallet
//! submits it unchanged; nothing downstream reinterprets it.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use innofund_common::amount::Amount;
use innofund_common::types::{Address, ChainId};

/// Gas buffer applied on top of an estimate, in percent.
const GAS_BUFFER_PERCENT: u64 = 20;

// ════════════════════════════════════════════════════════════════════════════
// CHAIN CALL
// ════════════════════════════════════════════════════════════════════════════

/// Transaction parameters for wallet submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainCall {
    pub to: Address,
    /// ABI-encoded calldata, `0x`-hex on the wire.
    #[serde(serialize_with = "serialize_hex_bytes", deserialize_with = "deserialize_hex_bytes")]
    pub data: Vec<u8>,
    /// Native value attached to the transaction (wei).
    pub value: Amount,
    pub gas_limit: u64,
    pub chain_id: ChainId,
}

/// Pad a gas estimate with the safety buffer the original deploy used,
/// or fall back to `fallback` when no estimate is available.
#[must_use]
pub fn gas_with_buffer(estimate: Option<u64>, fallback: u64) -> u64 {
    match estimate {
        Some(e) => e.saturating_add(e.saturating_mul(GAS_BUFFER_PERCENT) / 100),
        None => fallback,
    }
}

fn serialize_hex_bytes<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format!("0x{}", hex::encode(data)))
}

fn deserialize_hex_bytes<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
    let s = String::deserialize(d)?;
    let raw = s.strip_prefix("0x").unwrap_or(&s);
    hex::decode(raw).map_err(de::Error::custom)
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════
