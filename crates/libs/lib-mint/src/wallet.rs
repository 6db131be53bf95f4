//! # Wallet Session
//!
//! Local keypair wallet for the mint client. The session owns the signing
//! keypair; the rest of the library only ever reads the public identity and
//! hands the signer to the program client for transaction submission.
//!
//! Supported keypair sources:
//! - Solana CLI JSON files (`[1,2,3,...]`, 64 or 32 bytes)
//! - base58-encoded secret in a file or string

use std::fs;
use std::path::Path;
use std::sync::Arc;

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};
use tracing::info;

use crate::display::shorten_address;
use crate::error::{MintError, Result};

/// Connected wallet session holding the signing keypair.
pub struct WalletSession {
    keypair: Arc<Keypair>,
}

impl WalletSession {
    /// Load a keypair from file.
    ///
    /// Accepts the Solana CLI JSON array format (64-byte secret+public or
    /// bare 32-byte secret) or a base58-encoded secret.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| MintError::Wallet(format!("failed to read {}: {}", path.display(), e)))?;

        let bytes: Vec<u8> = if contents.trim().starts_with('[') {
            serde_json::from_str(&contents)
                .map_err(|e| MintError::Wallet(format!("invalid keypair JSON: {}", e)))?
        } else {
            bs58::decode(contents.trim())
                .into_vec()
                .map_err(|e| MintError::Wallet(format!("invalid base58 keypair: {}", e)))?
        };

        let session = Self::from_bytes(&bytes)?;
        info!("Wallet loaded: {}", session.short_address());
        Ok(session)
    }

    /// Build a session from raw secret bytes (32-byte seed, or 64-byte
    /// secret+public as written by the Solana CLI).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let seed: &[u8] = match bytes.len() {
            32 => bytes,
            64 => &bytes[..32],
            n => {
                return Err(MintError::Wallet(format!(
                    "expected 32 or 64 key bytes, got {}",
                    n
                )))
            }
        };
        let mut arr = [0u8; 32];
        arr.copy_from_slice(seed);

        Ok(Self {
            keypair: Arc::new(Keypair::new_from_array(arr)),
        })
    }

    /// Generate a fresh random keypair (devnet testing).
    pub fn generate() -> Self {
        Self {
            keypair: Arc::new(Keypair::new()),
        }
    }

    /// Connected public identity.
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Signing keypair, shared with the program client.
    pub fn signer(&self) -> Arc<Keypair> {
        Arc::clone(&self.keypair)
    }

    /// Shortened address for display (`8W6Q...JKAL` form).
    pub fn short_address(&self) -> String {
        shorten_address(&self.pubkey().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_accepts_cli_format() {
        let keypair = Keypair::new();
        let secret = keypair.to_bytes();
        assert_eq!(secret.len(), 64);

        let session = WalletSession::from_bytes(&secret).unwrap();
        assert_eq!(session.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_from_bytes_rejects_bad_length() {
        assert!(WalletSession::from_bytes(&[1u8; 16]).is_err());
    }

    #[test]
    fn test_generate_yields_distinct_identities() {
        let a = WalletSession::generate();
        let b = WalletSession::generate();
        assert_ne!(a.pubkey(), b.pubkey());
    }
}
