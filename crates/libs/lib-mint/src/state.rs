//! # Observable Mint State
//!
//! Shared state container for the mint client. The refresher publishes
//! on-chain counters into a [`StateCell`]; the display surface observes
//! changes through a `tokio::sync::watch` channel instead of ambient globals.
//!
//! ## Contents
//!
//! - [`MintState`] - on-chain counters and go-live timestamp
//! - [`MintPhase`] - the per-attempt state machine phase
//! - [`Banner`] - transient status message shown after each attempt
//! - [`StateCell`] - publish-on-change holder for all of the above

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

/// How long a status banner stays visible before it is cleared automatically.
pub const BANNER_DISPLAY: Duration = Duration::from_secs(6);

/// On-chain mint counters and the configured go-live timestamp.
///
/// Invariant: `redeemed + remaining == available` at every successful
/// refresh. Mutated only by the state refresher; read by the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MintState {
    /// Total items the program was configured with.
    pub available: u64,
    /// Items already minted.
    pub redeemed: u64,
    /// Items still mintable. Zero means sold out.
    pub remaining: u64,
    /// Timestamp after which minting is permitted.
    pub go_live_at: DateTime<Utc>,
}

impl MintState {
    /// Whether the collection is sold out (`remaining == 0`).
    pub fn is_sold_out(&self) -> bool {
        self.remaining == 0
    }

    /// Whether minting is permitted at `now` (go-live date reached).
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now >= self.go_live_at
    }

    /// Percentage of the collection minted so far, in `[0, 100]`.
    pub fn percent_minted(&self) -> f64 {
        if self.available == 0 {
            return 0.0;
        }
        (self.redeemed as f64 / self.available as f64) * 100.0
    }
}

/// Phase of the current mint attempt.
///
/// `Idle -> Submitting -> AwaitingConfirmation -> {Confirmed | Failed} -> Idle`;
/// the terminal phases are transient and collapse back to `Idle` as soon as
/// the attempt's banner has been published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MintPhase {
    #[default]
    Idle,
    Submitting,
    AwaitingConfirmation,
    Confirmed,
    Failed,
}

/// Banner severity, mirrored into the display surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// Transient status message shown after a mint attempt or refresh failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub message: String,
    pub severity: Severity,
}

/// A point-in-time view of everything the display surface renders.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Last successfully refreshed counters, `None` before the first refresh.
    pub mint: Option<MintState>,
    /// Sold-out flag; recomputed on refresh and forced by the program's
    /// sold-out error code even when `remaining` was previously nonzero.
    pub is_sold_out: bool,
    /// Phase of the current attempt.
    pub phase: MintPhase,
    /// Transient status banner, if one is showing.
    pub banner: Option<Banner>,
    /// Wallet balance in lamports, re-read after each attempt.
    pub balance_lamports: Option<u64>,
}

impl Snapshot {
    /// Whether minting is permitted at `now`. False until the first refresh.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.mint.map(|m| m.is_active(now)).unwrap_or(false)
    }
}

/// Publish-on-change state holder shared between the refresher, the mint
/// submitter, and the display surface.
///
/// Internally a `tokio::sync::watch` channel: writers call the `set_*`
/// methods, observers call [`subscribe`](StateCell::subscribe) and await
/// changes, or take a one-off [`snapshot`](StateCell::snapshot).
pub struct StateCell {
    tx: watch::Sender<Snapshot>,
    banner_seq: AtomicU64,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            tx,
            banner_seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Current state, cloned out of the channel.
    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    /// Publish freshly fetched counters and recompute the sold-out flag.
    pub fn set_mint_state(&self, mint: MintState) {
        debug_assert_eq!(mint.redeemed + mint.remaining, mint.available);
        self.tx.send_modify(|s| {
            s.is_sold_out = mint.is_sold_out();
            s.mint = Some(mint);
        });
        debug!(
            available = mint.available,
            redeemed = mint.redeemed,
            remaining = mint.remaining,
            "mint state refreshed"
        );
    }

    /// Force the sold-out flag, used when the program reports sold-out
    /// mid-submit before the counters have caught up.
    pub fn force_sold_out(&self) {
        self.tx.send_modify(|s| s.is_sold_out = true);
    }

    pub fn set_phase(&self, phase: MintPhase) {
        self.tx.send_modify(|s| s.phase = phase);
    }

    pub fn set_balance(&self, lamports: u64) {
        self.tx.send_modify(|s| s.balance_lamports = Some(lamports));
    }

    /// Show a banner and schedule it to clear after [`BANNER_DISPLAY`].
    ///
    /// A later banner supersedes the pending clear of an earlier one, so a
    /// fresh message is never wiped by a stale timer.
    pub fn set_banner(self: &Arc<Self>, message: impl Into<String>, severity: Severity) {
        let seq = self.banner_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let banner = Banner {
            message: message.into(),
            severity,
        };
        self.tx.send_modify(|s| s.banner = Some(banner));

        let cell = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(BANNER_DISPLAY).await;
            if cell.banner_seq.load(Ordering::SeqCst) == seq {
                cell.tx.send_modify(|s| s.banner = None);
            }
        });
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn state(available: u64, redeemed: u64) -> MintState {
        MintState {
            available,
            redeemed,
            remaining: available - redeemed,
            go_live_at: Utc::now() - TimeDelta::hours(1),
        }
    }

    #[test]
    fn test_counter_invariant_holds() {
        let s = state(2978, 1200);
        assert_eq!(s.redeemed + s.remaining, s.available);
        assert!(!s.is_sold_out());
    }

    #[test]
    fn test_sold_out_iff_remaining_zero() {
        assert!(state(2978, 2978).is_sold_out());
        assert!(!state(2978, 2977).is_sold_out());
    }

    #[test]
    fn test_percent_minted() {
        let s = state(2978, 1489);
        assert!((s.percent_minted() - 50.0).abs() < 0.001);
        assert_eq!(
            MintState {
                available: 0,
                redeemed: 0,
                remaining: 0,
                go_live_at: Utc::now(),
            }
            .percent_minted(),
            0.0
        );
    }

    #[test]
    fn test_is_active_tracks_go_live_date() {
        let now = Utc::now();
        let mut s = state(10, 0);
        s.go_live_at = now + TimeDelta::minutes(5);
        assert!(!s.is_active(now));
        assert!(s.is_active(now + TimeDelta::minutes(5)));
    }

    #[test]
    fn test_refresh_recomputes_sold_out_flag() {
        let cell = StateCell::new();
        cell.set_mint_state(state(2978, 2978));
        assert!(cell.snapshot().is_sold_out);

        // A later refresh with stock remaining clears the flag again.
        cell.set_mint_state(state(2978, 2000));
        assert!(!cell.snapshot().is_sold_out);
    }

    #[test]
    fn test_force_sold_out_overrides_counters() {
        let cell = StateCell::new();
        cell.set_mint_state(state(2978, 100));
        assert!(!cell.snapshot().is_sold_out);

        cell.force_sold_out();
        let snap = cell.snapshot();
        assert!(snap.is_sold_out);
        assert_eq!(snap.mint.unwrap().remaining, 2878);
    }

    #[tokio::test]
    async fn test_subscribers_observe_refresh() {
        let cell = StateCell::new();
        let mut rx = cell.subscribe();

        cell.set_mint_state(state(10, 1));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().mint.unwrap().redeemed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_banner_clears_after_display_duration() {
        let cell = Arc::new(StateCell::new());
        cell.set_banner("Congratulations! Mint succeeded!", Severity::Success);
        assert!(cell.snapshot().banner.is_some());

        tokio::time::sleep(BANNER_DISPLAY + Duration::from_secs(1)).await;
        assert!(cell.snapshot().banner.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_banner_survives_older_timer() {
        let cell = Arc::new(StateCell::new());
        cell.set_banner("Minting failed! Please try again!", Severity::Error);

        tokio::time::sleep(Duration::from_secs(4)).await;
        cell.set_banner("SOLD OUT!", Severity::Error);

        // The first banner's timer fires here but must not clear the second.
        tokio::time::sleep(Duration::from_secs(3)).await;
        let banner = cell.snapshot().banner.expect("second banner still visible");
        assert_eq!(banner.message, "SOLD OUT!");

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(cell.snapshot().banner.is_none());
    }
}
