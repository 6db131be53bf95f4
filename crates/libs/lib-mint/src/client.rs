//! # On-Chain Program Client
//!
//! Boundary to the mint program. The rest of the library talks to the chain
//! exclusively through the [`ProgramClient`] trait; [`CandyMachineClient`]
//! backs it with the Solana JSON-RPC client.
//!
//! ## Network Selection
//!
//! The client supports two Solana networks:
//! - **Mainnet**: production network, optionally via a Helius premium
//!   endpoint when an API key is configured
//! - **Devnet**: test network with free test tokens
//!
//! A custom RPC URL overrides network-based selection entirely.
//!
//! ## Program Error Codes
//!
//! The program reports mint-eligibility failures through custom instruction
//! error codes, surfaced here as constants so the service layer can map them
//! to user-facing messages:
//!
//! | code | hex | meaning |
//! |---|---|---|
//! | 309 | 0x135 | insufficient funds |
//! | 311 | 0x137 | sold out |
//! | 312 | 0x138 | mint not live yet |

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use borsh::BorshDeserialize;
use chrono::{DateTime, Utc};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    instruction::{AccountMeta, Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    sysvar,
    transaction::{Transaction, TransactionError},
};
use solana_system_interface::program as system_program;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{MintError, Result};
use crate::state::MintState;

/// Program error code for an insufficient-funds mint attempt (0x135).
pub const CODE_INSUFFICIENT_FUNDS: u32 = 309;
/// Program error code for a sold-out collection (0x137).
pub const CODE_SOLD_OUT: u32 = 311;
/// Program error code for minting before the go-live date (0x138).
pub const CODE_NOT_LIVE: u32 = 312;

/// Solana network selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// Solana mainnet-beta (production network)
    Mainnet,
    /// Solana devnet (test network)
    Devnet,
}

/// Finalized status of a submitted transaction.
///
/// `transaction_status` returns `None` while the transaction has not reached
/// finality; once finalized it is one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmedStatus {
    /// Finalized with no error.
    Success,
    /// Finalized with an on-chain failure. `code` carries the program's
    /// custom error code when the failure was a custom instruction error.
    Failed { code: Option<u32> },
}

/// Black-box view of the on-chain mint program.
///
/// The service layer depends only on this trait, which keeps the refresh and
/// mint logic testable against a scripted in-memory implementation.
#[async_trait]
pub trait ProgramClient: Send + Sync {
    /// Fetch current counters and the configured go-live timestamp.
    async fn fetch_state(&self) -> Result<MintState>;

    /// Submit one mint transaction paying from `buyer` into `treasury`,
    /// returning the transaction id.
    async fn submit_mint(&self, buyer: &Pubkey, treasury: &Pubkey) -> Result<String>;

    /// Query finality of a previously submitted transaction.
    /// `Ok(None)` means not yet finalized.
    async fn transaction_status(&self, id: &str) -> Result<Option<ConfirmedStatus>>;

    /// Lamport balance of `owner`, re-read after each attempt.
    async fn balance(&self, owner: &Pubkey) -> Result<u64>;
}

/// Machine account layout: 8-byte Anchor discriminator followed by these
/// borsh-encoded fields.
#[derive(Debug, BorshDeserialize)]
struct MachineAccount {
    _authority: [u8; 32],
    _wallet: [u8; 32],
    _token_mint: Option<[u8; 32]>,
    _config: [u8; 32],
    data: MachineData,
    items_redeemed: u64,
    _bump: u8,
}

#[derive(Debug, BorshDeserialize)]
struct MachineData {
    _uuid: String,
    _price: u64,
    items_available: u64,
    go_live_date: Option<i64>,
}

/// Anchor instruction discriminator for the program's `mint_nft` entry point.
const MINT_IX_DISCRIMINATOR: [u8; 8] = [211, 57, 6, 167, 15, 219, 35, 251];

/// Solana RPC implementation of [`ProgramClient`].
///
/// Holds the program addresses from configuration plus the wallet's signing
/// keypair; all methods are async and go through the nonblocking RPC client.
pub struct CandyMachineClient {
    rpc: Arc<RpcClient>,
    program_id: Pubkey,
    candy_machine: Pubkey,
    config_account: Pubkey,
    signer: Arc<Keypair>,
}

/// Program id of the mint program.
pub const MINT_PROGRAM_ID: &str = "cndyAnrLdpjq1Ssp1z8xxDsB8dxe7u4HL5Nxi2K5WXZ";

impl CandyMachineClient {
    /// Create a client from validated configuration and the wallet's signer.
    ///
    /// # RPC Endpoint Selection
    ///
    /// - Custom `RPC_URL` when configured
    /// - Mainnet + Helius key: `https://mainnet.helius-rpc.com/?api-key={key}`
    /// - Mainnet without key: `https://api.mainnet-beta.solana.com`
    /// - Devnet: `https://api.devnet.solana.com`
    pub fn from_config(config: &Config, signer: Arc<Keypair>) -> Result<Self> {
        let url = rpc_url(config);
        info!("Connecting to Solana RPC: {}", url);

        let program_id = Pubkey::from_str(MINT_PROGRAM_ID)
            .map_err(|e| MintError::Config(format!("bad program id: {}", e)))?;

        Ok(Self {
            rpc: Arc::new(RpcClient::new(url)),
            program_id,
            candy_machine: config.candy_machine_id,
            config_account: config.candy_config_id,
            signer,
        })
    }

    fn decode_machine(&self, data: &[u8]) -> Result<MintState> {
        if data.len() < 8 {
            return Err(MintError::Decode(
                "machine account data shorter than discriminator".to_string(),
            ));
        }
        let mut body = &data[8..];
        let account = MachineAccount::deserialize(&mut body)
            .map_err(|e| MintError::Decode(format!("machine account: {}", e)))?;

        let available = account.data.items_available;
        let redeemed = account.items_redeemed.min(available);
        let go_live_at = account
            .data
            .go_live_date
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Ok(MintState {
            available,
            redeemed,
            remaining: available - redeemed,
            go_live_at,
        })
    }
}

#[async_trait]
impl ProgramClient for CandyMachineClient {
    async fn fetch_state(&self) -> Result<MintState> {
        let account = self
            .rpc
            .get_account(&self.candy_machine)
            .await
            .map_err(|e| MintError::Fetch(format!("machine account query: {}", e)))?;

        self.decode_machine(&account.data)
    }

    async fn submit_mint(&self, buyer: &Pubkey, treasury: &Pubkey) -> Result<String> {
        let instruction = Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.candy_machine, false),
                AccountMeta::new_readonly(self.config_account, false),
                AccountMeta::new(*buyer, true),
                AccountMeta::new(*treasury, false),
                AccountMeta::new_readonly(system_program::id(), false),
                AccountMeta::new_readonly(sysvar::clock::id(), false),
            ],
            data: MINT_IX_DISCRIMINATOR.to_vec(),
        };

        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| MintError::Rpc(format!("failed to get blockhash: {}", e)))?;

        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(buyer),
            &[self.signer.as_ref()],
            blockhash,
        );

        let signature = self
            .rpc
            .send_transaction(&transaction)
            .await
            .map_err(|e| {
                let code = e.get_transaction_error().and_then(|t| custom_code(&t));
                MintError::Submit {
                    message: e.to_string(),
                    code,
                }
            })?;

        debug!(%signature, "mint transaction submitted");
        Ok(signature.to_string())
    }

    async fn transaction_status(&self, id: &str) -> Result<Option<ConfirmedStatus>> {
        let signature = Signature::from_str(id)
            .map_err(|e| MintError::Rpc(format!("invalid transaction id: {}", e)))?;

        let status = self
            .rpc
            .get_signature_status(&signature)
            .await
            .map_err(|e| MintError::Rpc(format!("status query: {}", e)))?;

        Ok(status.map(|result| match result {
            Ok(()) => ConfirmedStatus::Success,
            Err(err) => ConfirmedStatus::Failed {
                code: custom_code(&err),
            },
        }))
    }

    async fn balance(&self, owner: &Pubkey) -> Result<u64> {
        self.rpc
            .get_balance(owner)
            .await
            .map_err(|e| MintError::Rpc(format!("balance query: {}", e)))
    }
}

fn rpc_url(config: &Config) -> String {
    if let Some(url) = &config.rpc_url {
        return url.clone();
    }
    match config.network {
        Network::Mainnet => {
            if let Some(key) = &config.helius_api_key {
                format!("https://mainnet.helius-rpc.com/?api-key={}", key)
            } else {
                "https://api.mainnet-beta.solana.com".to_string()
            }
        }
        Network::Devnet => "https://api.devnet.solana.com".to_string(),
    }
}

/// Extract the program's custom error code from a transaction error, if any.
fn custom_code(err: &TransactionError) -> Option<u32> {
    match err {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_code_extraction() {
        let err = TransactionError::InstructionError(0, InstructionError::Custom(CODE_SOLD_OUT));
        assert_eq!(custom_code(&err), Some(311));

        let err = TransactionError::AccountNotFound;
        assert_eq!(custom_code(&err), None);
    }

    #[test]
    fn test_error_code_constants_match_hex() {
        assert_eq!(CODE_INSUFFICIENT_FUNDS, 0x135);
        assert_eq!(CODE_SOLD_OUT, 0x137);
        assert_eq!(CODE_NOT_LIVE, 0x138);
    }
}
