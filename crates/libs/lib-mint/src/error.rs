//! # Centralized Error Handling
//!
//! This module defines the library-wide error type [`MintError`] used
//! consistently across all modules. It follows the `thiserror` pattern for
//! ergonomic error handling.
//!
//! ## Error Categories
//!
//! Errors are categorized by where in the mint flow they arise:
//!
//! 1. **Refresh errors** - produced by the state refresher
//!    - [`Unavailable`](MintError::Unavailable) - no wallet connected, refresh is a no-op
//!    - [`Fetch`](MintError::Fetch) - the on-chain state query failed (prior state stays stale)
//!
//! 2. **Attempt errors** - produced before a transaction id exists
//!    - [`Submit`](MintError::Submit) - the mint call itself failed, optionally
//!      carrying the program's custom error code
//!
//! 3. **Ambient errors** - configuration, wallet, and RPC plumbing
//!    - [`Config`](MintError::Config), [`Wallet`](MintError::Wallet),
//!      [`Rpc`](MintError::Rpc), [`Decode`](MintError::Decode)
//!
//! Confirmation timeouts and on-chain failure codes observed *after* a
//! transaction id exists are not errors: the polling loop returns a tagged
//! [`ConfirmOutcome`](crate::service::ConfirmOutcome) instead, so the timeout
//! path never relies on exception-style control flow.
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_mint::error::{MintError, Result};
//!
//! fn parse_interval(ms: u64) -> Result<u64> {
//!     if ms == 0 {
//!         return Err(MintError::Config(
//!             "poll interval must be greater than zero".to_string(),
//!         ));
//!     }
//!     Ok(ms)
//! }
//! ```

use thiserror::Error;

/// Convenience type alias for `Result<T, MintError>`.
pub type Result<T> = std::result::Result<T, MintError>;

/// Library-wide error type covering all error scenarios.
///
/// Each variant includes descriptive context. The `#[error]` attribute from
/// `thiserror` provides the `Display` implementation.
#[derive(Debug, Error)]
pub enum MintError {
    /// No wallet is connected; the requested operation is a no-op.
    #[error("No wallet connected")]
    Unavailable,

    /// The on-chain program state query failed (network, RPC, or decode).
    #[error("State fetch failed: {0}")]
    Fetch(String),

    /// The mint submission failed before a transaction id was produced.
    ///
    /// `code` carries the program's custom error code when the failure came
    /// back from transaction simulation (sold out, not live, insufficient
    /// funds); `None` for wallet-side or transport failures.
    #[error("Mint submission failed: {message}")]
    Submit {
        message: String,
        code: Option<u32>,
    },

    /// Configuration error during startup or environment loading.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wallet keypair loading or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Solana RPC client error (network, rate limit, node issues).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// On-chain account data decoding error.
    #[error("Decoding error: {0}")]
    Decode(String),
}

impl MintError {
    /// The program's custom error code, when this error carries one.
    pub fn program_code(&self) -> Option<u32> {
        match self {
            MintError::Submit { code, .. } => *code,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_error_exposes_program_code() {
        let err = MintError::Submit {
            message: "custom program error: 0x137".to_string(),
            code: Some(311),
        };
        assert_eq!(err.program_code(), Some(311));

        let err = MintError::Fetch("connection refused".to_string());
        assert_eq!(err.program_code(), None);
    }
}
