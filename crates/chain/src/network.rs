//! Network descriptor handed to the wallet.
//!
//! This is the exact JSON shape `wallet_addEthereumChain` expects:
//! hex chain id, display name, native currency and URL lists. Built
//! once from [`NetworkConfig`] and treated as immutable.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use innofund_common::config::NetworkConfig;
use innofund_common::types::ChainId;

// ════════════════════════════════════════════════════════════════════════════
// NATIVE CURRENCY
// ════════════════════════════════════════════════════════════════════════════

/// Native currency block of the wallet network descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

// ════════════════════════════════════════════════════════════════════════════
// NETWORK DESCRIPTOR
// ════════════════════════════════════════════════════════════════════════════

/// Chain registration parameters, wallet wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDescriptor {
    /// Hex-encoded on the wire (`"0xa869"` for Fuji).
    #[serde(
        serialize_with = "serialize_chain_id_hex",
        deserialize_with = "deserialize_chain_id_hex"
    )]
    pub chain_id: ChainId,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

impl NetworkDescriptor {
    /// Build the descriptor from backend configuration.
    #[must_use]
    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self {
            chain_id: ChainId(cfg.chain_id),
            chain_name: cfg.chain_name.clone(),
            native_currency: NativeCurrency {
                name: cfg.currency_name.clone(),
                symbol: cfg.currency_symbol.clone(),
                decimals: cfg.currency_decimals,
            },
            rpc_urls: cfg.rpc_urls.clone(),
            block_explorer_urls: cfg.explorer_urls.clone(),
        }
    }
}

fn serialize_chain_id_hex<S: Serializer>(id: &ChainId, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&id.as_hex())
}

fn deserialize_chain_id_hex<'de, D: Deserializer<'de>>(d: D) -> Result<ChainId, D::Error> {
    let s = String::deserialize(d)?;
    let raw = s.strip_prefix("0x").unwrap_or(&s);
    u64::from_str_radix(raw, 16)
        .map(ChainId)
        .map_err(|_| de::Error::custom(format!("invalid hex chain id {:?}", s)))
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuji_descriptor_wire_shape() {
        let d = NetworkDescriptor::from_config(&NetworkConfig::default());
        let v: serde_json::Value = serde_json::to_value(&d).unwrap();
        assert_eq!(v["chainId"], "0xa869");
        assert_eq!(v["chainName"], "Avalanche Fuji Testnet");
        assert_eq!(v["nativeCurrency"]["symbol"], "AVAX");
        assert_eq!(v["nativeCurrency"]["decimals"], 18);
        assert!(v["rpcUrls"].as_array().unwrap().len() == 1);
        assert!(v["blockExplorerUrls"].as_array().is_some());
    }

    #[test]
    fn test_descriptor_roundtrip() {
        let d = NetworkDescriptor::from_config(&NetworkConfig::default());
        let json = serde_json::to_string(&d).unwrap();
        let back: NetworkDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
        assert_eq!(back.chain_id, ChainId(43113));
    }
}
