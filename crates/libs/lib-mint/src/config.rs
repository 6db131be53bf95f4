//! # Application Configuration
//!
//! This module manages configuration loaded from environment variables.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Environment Variables
//!
//! | Variable | Required | Default | Purpose |
//! |---|---|---|---|
//! | `CANDY_MACHINE_ID` | yes | - | Address of the mint program's machine account |
//! | `CANDY_CONFIG_ID` | yes | - | Address of the program's config account |
//! | `TREASURY_ADDRESS` | yes | - | Treasury receiving mint payments |
//! | `KEYPAIR_PATH` | no | `~/.config/solana/id.json` | Wallet keypair file |
//! | `NETWORK` | no | `devnet` | `mainnet` or `devnet` |
//! | `HELIUS_API_KEY` | no | - | Premium RPC endpoint key (mainnet) |
//! | `RPC_URL` | no | - | Custom RPC URL, overrides network selection |
//! | `TX_TIMEOUT_MS` | no | `30000` | Confirmation deadline per attempt |
//! | `POLL_INTERVAL_MS` | no | `3000` | Interval between confirmation queries |

use std::env;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;

use crate::client::Network;
use crate::error::{MintError, Result};

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    /// Address of the on-chain machine account holding the mint counters.
    pub candy_machine_id: Pubkey,

    /// Address of the program's config account.
    pub candy_config_id: Pubkey,

    /// Treasury account that receives mint payments.
    pub treasury: Pubkey,

    /// Path to the wallet keypair file (Solana CLI JSON format).
    pub keypair_path: String,

    /// Target network (ignored when `rpc_url` is set).
    pub network: Network,

    /// Optional Helius API key for premium mainnet RPC access.
    pub helius_api_key: Option<String>,

    /// Optional custom RPC URL, overrides network-based selection.
    pub rpc_url: Option<String>,

    /// Confirmation deadline per mint attempt, in milliseconds.
    pub tx_timeout_ms: u64,

    /// Interval between confirmation status queries, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let candy_machine_id = required_pubkey("CANDY_MACHINE_ID")?;
        let candy_config_id = required_pubkey("CANDY_CONFIG_ID")?;
        let treasury = required_pubkey("TREASURY_ADDRESS")?;

        let keypair_path = env::var("KEYPAIR_PATH")
            .unwrap_or_else(|_| default_keypair_path());

        let network = match env::var("NETWORK").as_deref() {
            Ok("mainnet") => Network::Mainnet,
            Ok("devnet") | Err(_) => Network::Devnet,
            Ok(other) => {
                return Err(MintError::Config(format!(
                    "NETWORK must be 'mainnet' or 'devnet', got '{}'",
                    other
                )))
            }
        };

        let helius_api_key = env::var("HELIUS_API_KEY").ok();
        let rpc_url = env::var("RPC_URL").ok();

        let tx_timeout_ms = parse_millis("TX_TIMEOUT_MS", 30_000)?;
        let poll_interval_ms = parse_millis("POLL_INTERVAL_MS", 3_000)?;

        Ok(Self {
            candy_machine_id,
            candy_config_id,
            treasury,
            keypair_path,
            network,
            helius_api_key,
            rpc_url,
            tx_timeout_ms,
            poll_interval_ms,
        })
    }

    /// Validate configuration values against business rules.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(MintError::Config(
                "POLL_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        if self.tx_timeout_ms < self.poll_interval_ms {
            return Err(MintError::Config(
                "TX_TIMEOUT_MS must be at least POLL_INTERVAL_MS".to_string(),
            ));
        }

        Ok(())
    }
}

fn required_pubkey(name: &str) -> Result<Pubkey> {
    let value = env::var(name)
        .map_err(|_| MintError::Config(format!("{} must be set in environment", name)))?;
    Pubkey::from_str(&value)
        .map_err(|e| MintError::Config(format!("{} is not a valid address: {}", name, e)))
}

fn parse_millis(name: &str, default: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|e| MintError::Config(format!("{} must be a valid number: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn default_keypair_path() -> String {
    match env::var("HOME") {
        Ok(home) => format!("{}/.config/solana/id.json", home),
        Err(_) => "id.json".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            candy_machine_id: Pubkey::new_unique(),
            candy_config_id: Pubkey::new_unique(),
            treasury: Pubkey::new_unique(),
            keypair_path: "id.json".to_string(),
            network: Network::Devnet,
            helius_api_key: None,
            rpc_url: None,
            tx_timeout_ms: 30_000,
            poll_interval_ms: 3_000,
        }
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = base_config();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_timeout_below_interval() {
        let mut config = base_config();
        config.tx_timeout_ms = 1_000;
        config.poll_interval_ms = 3_000;
        assert!(config.validate().is_err());
    }
}
