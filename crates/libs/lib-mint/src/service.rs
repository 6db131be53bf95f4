//! # Mint Service
//!
//! Orchestrates the two behaviors of the client: the state refresher and the
//! mint submitter.
//!
//! ## Overview
//!
//! - **Refresh**: fetch current counters and the go-live timestamp from the
//!   program and republish them through the shared [`StateCell`].
//! - **Mint**: drive one mint-and-confirm cycle through the phase machine
//!   `Idle -> Submitting -> AwaitingConfirmation -> {Confirmed | Failed} -> Idle`,
//!   mapping the outcome to a fixed banner message.
//!
//! At most one attempt is in flight at a time, enforced by the phase guard
//! rather than a lock: a mint request is skipped outright when the collection
//! is sold out, the go-live date has not passed, or an attempt is already
//! running. After every attempt (success or failure) the wallet balance is
//! re-read and the refresher runs exactly once to reconcile counters.
//!
//! Confirmation is an explicit bounded poll: repeated status queries at a
//! fixed interval until a terminal status is seen or the deadline elapses,
//! returning a tagged [`ConfirmOutcome`] rather than erroring on timeout.
//! There are no retries past the deadline; the user must re-trigger manually.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::client::{
    ProgramClient, ConfirmedStatus, CODE_INSUFFICIENT_FUNDS, CODE_NOT_LIVE, CODE_SOLD_OUT,
};
use crate::config::Config;
use crate::error::{MintError, Result};
use crate::state::{MintPhase, MintState, Severity, StateCell};

/// Banner shown when a mint confirms cleanly.
pub const MSG_SUCCESS: &str = "Congratulations! Mint succeeded!";
/// Banner shown when a mint finalizes with an on-chain error.
pub const MSG_CONFIRMED_FAILED: &str = "Mint failed! Please try again!";
/// Banner for any other failure, including the confirmation deadline.
pub const MSG_GENERIC_FAILURE: &str = "Minting failed! Please try again!";
/// Banner when the program reports the collection sold out mid-submit.
pub const MSG_SOLD_OUT: &str = "SOLD OUT!";
/// Banner when the program reports the go-live date has not passed.
pub const MSG_NOT_LIVE: &str = "Minting period hasn't started yet.";
/// Banner when the buyer cannot cover the mint price.
pub const MSG_INSUFFICIENT_FUNDS: &str = "Insufficient funds to mint. Please fund your wallet.";

/// Result of one confirmation-polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Finalized with no error.
    Confirmed,
    /// Finalized with an on-chain failure code.
    Failed { code: Option<u32> },
    /// No terminal status observed before the deadline.
    TimedOut,
}

/// Result of one user-triggered mint request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MintOutcome {
    /// The guard rejected the request; nothing was submitted.
    Skipped,
    /// The mint confirmed on-chain.
    Confirmed,
    /// The attempt failed or timed out; see the banner for the reason.
    Failed,
}

/// Orchestration unit wrapping the program client and the shared state cell.
pub struct MintService {
    program: Arc<dyn ProgramClient>,
    state: Arc<StateCell>,
    treasury: Pubkey,
    poll_interval: Duration,
    confirm_deadline: Duration,
}

impl MintService {
    pub fn new(
        program: Arc<dyn ProgramClient>,
        state: Arc<StateCell>,
        treasury: Pubkey,
        poll_interval: Duration,
        confirm_deadline: Duration,
    ) -> Self {
        Self {
            program,
            state,
            treasury,
            poll_interval,
            confirm_deadline,
        }
    }

    /// Create a service with timing and treasury taken from configuration.
    pub fn from_config(
        program: Arc<dyn ProgramClient>,
        state: Arc<StateCell>,
        config: &Config,
    ) -> Self {
        Self::new(
            program,
            state,
            config.treasury,
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_millis(config.tx_timeout_ms),
        )
    }

    /// Shared state cell, for observers.
    pub fn state(&self) -> &Arc<StateCell> {
        &self.state
    }

    /// Fetch current counters and republish them.
    ///
    /// Fails with [`MintError::Unavailable`] when no wallet is connected (the
    /// prior state stays untouched) or [`MintError::Fetch`] when the program
    /// query fails (the prior state stays stale until the next trigger).
    #[instrument(skip_all)]
    pub async fn refresh(&self, wallet: Option<&Pubkey>) -> Result<MintState> {
        let Some(wallet) = wallet else {
            return Err(MintError::Unavailable);
        };
        debug!(%wallet, "refreshing mint state");

        let mint = self.program.fetch_state().await?;
        self.state.set_mint_state(mint);
        Ok(mint)
    }

    /// Read the wallet's lamport balance and publish it.
    ///
    /// Invoked on wallet connect and after every mint attempt. Fails with
    /// [`MintError::Unavailable`] when no wallet is connected.
    pub async fn refresh_balance(&self, wallet: Option<&Pubkey>) -> Result<u64> {
        let Some(owner) = wallet else {
            return Err(MintError::Unavailable);
        };
        let lamports = self.program.balance(owner).await?;
        self.state.set_balance(lamports);
        Ok(lamports)
    }

    /// Drive one mint-and-confirm cycle.
    ///
    /// Skipped without side effects when no wallet is connected, the
    /// collection is sold out, the go-live date has not passed, or another
    /// attempt is in flight. Otherwise runs to a terminal outcome, publishes
    /// the matching banner, reconciles balance and counters, and returns the
    /// phase machine to `Idle`.
    #[instrument(skip_all)]
    pub async fn mint(&self, wallet: Option<&Pubkey>) -> MintOutcome {
        let Some(buyer) = wallet else {
            return MintOutcome::Skipped;
        };

        let snapshot = self.state.snapshot();
        if snapshot.is_sold_out
            || !snapshot.is_active(Utc::now())
            || snapshot.phase != MintPhase::Idle
        {
            debug!(
                sold_out = snapshot.is_sold_out,
                phase = ?snapshot.phase,
                "mint request skipped by guard"
            );
            return MintOutcome::Skipped;
        }

        self.state.set_phase(MintPhase::Submitting);
        let mut force_sold_out = false;
        let outcome = match self.run_attempt(buyer).await {
            Ok(ConfirmOutcome::Confirmed) => {
                info!("mint confirmed");
                self.state.set_phase(MintPhase::Confirmed);
                self.state.set_banner(MSG_SUCCESS, Severity::Success);
                MintOutcome::Confirmed
            }
            Ok(ConfirmOutcome::Failed { code }) => {
                warn!(?code, "mint finalized with on-chain error");
                self.state.set_phase(MintPhase::Failed);
                self.state.set_banner(MSG_CONFIRMED_FAILED, Severity::Error);
                MintOutcome::Failed
            }
            Ok(ConfirmOutcome::TimedOut) => {
                warn!("confirmation deadline elapsed");
                self.state.set_phase(MintPhase::Failed);
                self.state.set_banner(MSG_GENERIC_FAILURE, Severity::Error);
                MintOutcome::Failed
            }
            Err(err) => {
                warn!("mint submission failed: {}", err);
                self.state.set_phase(MintPhase::Failed);
                let (message, sold_out) = submit_failure_message(&err);
                force_sold_out = sold_out;
                if sold_out {
                    self.state.force_sold_out();
                }
                self.state.set_banner(message, Severity::Error);
                MintOutcome::Failed
            }
        };

        // Reconcile after every attempt: balance first, then exactly one
        // refresh to bring the counters back in line.
        if let Err(err) = self.refresh_balance(Some(buyer)).await {
            warn!("balance refresh failed: {}", err);
        }
        if let Err(err) = self.refresh(Some(buyer)).await {
            warn!("post-attempt refresh failed: {}", err);
        }
        // The refresh recomputes the sold-out flag from counters that may
        // not have caught up with the program's verdict; the verdict wins.
        if force_sold_out {
            self.state.force_sold_out();
        }

        self.state.set_phase(MintPhase::Idle);
        outcome
    }

    async fn run_attempt(&self, buyer: &Pubkey) -> Result<ConfirmOutcome> {
        let tx_id = self.program.submit_mint(buyer, &self.treasury).await?;
        info!(tx_id = %tx_id, "mint transaction accepted");
        self.state.set_phase(MintPhase::AwaitingConfirmation);

        Ok(self
            .await_confirmation(&tx_id, self.poll_interval, self.confirm_deadline)
            .await)
    }

    /// Poll for transaction finality at `poll_interval` until a terminal
    /// status is observed or `deadline` elapses.
    ///
    /// Transient status-query errors are logged and retried on the next tick;
    /// only an observed terminal status or the deadline ends the loop.
    pub async fn await_confirmation(
        &self,
        tx_id: &str,
        poll_interval: Duration,
        deadline: Duration,
    ) -> ConfirmOutcome {
        let deadline_at = Instant::now() + deadline;
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            match self.program.transaction_status(tx_id).await {
                Ok(Some(ConfirmedStatus::Success)) => return ConfirmOutcome::Confirmed,
                Ok(Some(ConfirmedStatus::Failed { code })) => {
                    return ConfirmOutcome::Failed { code }
                }
                Ok(None) => debug!(tx_id = %tx_id, "not yet finalized"),
                Err(err) => warn!("status query failed, will retry: {}", err),
            }
            if Instant::now() >= deadline_at {
                return ConfirmOutcome::TimedOut;
            }
        }
    }
}

/// Map a pre-transaction-id failure to its banner message. The second field
/// is whether the sold-out flag must be forced.
fn submit_failure_message(err: &MintError) -> (&'static str, bool) {
    match err.program_code() {
        Some(CODE_SOLD_OUT) => (MSG_SOLD_OUT, true),
        Some(CODE_NOT_LIVE) => (MSG_NOT_LIVE, false),
        Some(CODE_INSUFFICIENT_FUNDS) => (MSG_INSUFFICIENT_FUNDS, false),
        _ => (MSG_GENERIC_FAILURE, false),
    }
}
