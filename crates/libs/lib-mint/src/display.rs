//! # Display Helpers
//!
//! Formatting utilities for the status readout: shortened addresses, lamport
//! conversion, and countdown rendering. Purely presentational.

use chrono::{DateTime, TimeDelta, Utc};

/// Shorten an address to its first and last four characters
/// (e.g. `8W6QginkhTTxoP2deQjq7rZ9YMwN5FH9JYuLfSKuJKAL` -> `8W6Q...JKAL`).
pub fn shorten_address(address: &str) -> String {
    if address.len() <= 8 {
        return address.to_string();
    }
    format!("{}...{}", &address[..4], &address[address.len() - 4..])
}

/// Convert lamports to SOL (1 SOL = 1,000,000,000 lamports).
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

/// Render the time remaining until `go_live_at` as
/// `"H hours, M minutes, S seconds"`, with days folded into hours.
///
/// Returns `None` once the go-live date has passed.
pub fn format_countdown(go_live_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<String> {
    let left: TimeDelta = go_live_at - now;
    if left <= TimeDelta::zero() {
        return None;
    }

    let hours = left.num_hours();
    let minutes = left.num_minutes() % 60;
    let seconds = left.num_seconds() % 60;
    Some(format!(
        "{} hours, {} minutes, {} seconds",
        hours, minutes, seconds
    ))
}
