//! # Mint Client Library
//!
//! Headless client for a "candy machine" style on-chain NFT mint program:
//! wallet session management, on-chain counter refresh, mint submission, and
//! bounded transaction-confirmation polling.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod service;
pub mod state;
pub mod wallet;

// Re-export commonly used types from root for convenience
pub use client::{CandyMachineClient, ConfirmedStatus, Network, ProgramClient};
pub use config::Config;
pub use error::{MintError, Result};
pub use service::{ConfirmOutcome, MintOutcome, MintService};
pub use state::{Banner, MintPhase, MintState, Severity, StateCell};
pub use wallet::WalletSession;
