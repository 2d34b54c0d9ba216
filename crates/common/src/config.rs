//! Backend configuration via TOML and serde.
//!
//! Every value has an explicit, deterministic default. Components never
//! read the environment themselves; the loader runs once in `main` and
//! the resulting `Config` is passed down by reference.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::Result;

// ════════════════════════════════════════════════════════════════════════════
// NETWORK
// ════════════════════════════════════════════════════════════════════════════

/// Target chain parameters. Defaults describe Avalanche Fuji testnet,
/// the network the contracts are deployed on.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub currency_decimals: u8,
    pub rpc_urls: Vec<String>,
    pub explorer_urls: Vec<String>,
    /// Funding contract address (hex).
    pub funding_contract: String,
    /// DAO contract address (hex).
    pub dao_contract: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: 43113,
            chain_name: "Avalanche Fuji Testnet".to_string(),
            currency_name: "Avalanche".to_string(),
            currency_symbol: "AVAX".to_string(),
            currency_decimals: 18,
            rpc_urls: vec!["https://api.avax-test.network/ext/bc/C/rpc".to_string()],
            explorer_urls: vec!["https://testnet.snowtrace.io/".to_string()],
            funding_contract: "0x0000000000000000000000000000000000000000".to_string(),
            dao_contract: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GOVERNANCE
// ════════════════════════════════════════════════════════════════════════════

/// Governance timing and quorum parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Delay between proposal creation and voting start (seconds).
    pub voting_delay_secs: u64,
    /// Length of the voting window (seconds).
    pub voting_period_secs: u64,
    /// Minimum total participation (For + Against + Abstain) for a
    /// proposal to be decisive.
    pub quorum_votes: u64,
    /// Window after queueing in which a Succeeded proposal may be
    /// executed before it expires (seconds).
    pub execution_window_secs: u64,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            voting_delay_secs: 3600,
            voting_period_secs: 604_800, // 7 days
            quorum_votes: 4,
            execution_window_secs: 1_209_600, // 14 days
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL CONFIG
// ════════════════════════════════════════════════════════════════════════════

/// Backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address for the HTTP API.
    pub bind_addr: String,
    /// Platform fee in basis points.
    pub fee_bps: u32,
    /// Seconds after which an unconsumed Intent is stale.
    pub intent_ttl_secs: u64,
    /// Gas fallback when estimation is unavailable.
    pub gas_fallback: u64,
    pub network: NetworkConfig,
    pub governance: GovernanceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            fee_bps: crate::fee::DEFAULT_FEE_BPS,
            intent_ttl_secs: 180,
            gas_fallback: 300_000,
            network: NetworkConfig::default(),
            governance: GovernanceConfig::default(),
        }
    }
}

/// Load config from a TOML file path.
/// If the file is missing or fails to parse, an error is returned.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let s = fs::read_to_string(path.as_ref())?;
    let cfg: Config = toml::from_str(&s)?;
    Ok(cfg)
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_fuji() {
        let cfg = Config::default();
        assert_eq!(cfg.network.chain_id, 43113);
        assert_eq!(cfg.network.currency_symbol, "AVAX");
        assert_eq!(cfg.fee_bps, 50);
        assert_eq!(cfg.intent_ttl_secs, 180);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let cfg: Config = toml::from_str(
            r#"
            fee_bps = 200

            [governance]
            quorum_votes = 10
            "#,
        )
        .unwrap();
        assert_eq!(cfg.fee_bps, 200);
        assert_eq!(cfg.governance.quorum_votes, 10);
        // untouched sections keep defaults
        assert_eq!(cfg.network.chain_id, 43113);
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_bad_toml_is_error() {
        let res: std::result::Result<Config, _> = toml::from_str("fee_bps = \"lots\"");
        assert!(res.is_err());
    }
}
