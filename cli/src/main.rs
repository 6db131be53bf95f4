//! # Mint CLI
//!
//! Terminal display surface for the mint client. Two commands:
//!
//! - `mint-cli status` (default): refresh and print counters, countdown, and
//!   wallet balance
//! - `mint-cli mint`: run one mint-and-confirm cycle, then print the
//!   reconciled state and the attempt's status banner
//!
//! Configuration comes from the environment (see `lib-mint`'s config module);
//! a `.env` file is honored.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lib_mint::display::{format_countdown, lamports_to_sol};
use lib_mint::state::Snapshot;
use lib_mint::{CandyMachineClient, Config, MintService, StateCell, WalletSession};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "status".to_string());

    let config = Config::from_env()?;
    config.validate()?;

    let wallet = WalletSession::load_from_file(&config.keypair_path)
        .context("failed to load wallet keypair")?;
    let buyer = wallet.pubkey();

    let program = Arc::new(CandyMachineClient::from_config(&config, wallet.signer())?);
    let state = Arc::new(StateCell::new());
    let service = MintService::from_config(program, state.clone(), &config);

    service
        .refresh(Some(&buyer))
        .await
        .context("initial state refresh failed")?;
    if let Err(err) = service.refresh_balance(Some(&buyer)).await {
        warn!("balance query failed: {}", err);
    }

    match command.as_str() {
        "status" => {}
        "mint" => {
            info!("submitting mint request");
            let outcome = service.mint(Some(&buyer)).await;
            info!(?outcome, "mint attempt finished");
        }
        other => {
            anyhow::bail!("unknown command '{}' (expected 'status' or 'mint')", other);
        }
    }

    render(&state.snapshot(), &wallet);
    Ok(())
}

/// Print the current snapshot: wallet, balance, counters, progress, and the
/// countdown-or-ready line, plus the transient banner if one is showing.
fn render(snapshot: &Snapshot, wallet: &WalletSession) {
    println!("Wallet {}", wallet.short_address());
    if let Some(lamports) = snapshot.balance_lamports {
        println!("Balance: {:.4} SOL", lamports_to_sol(lamports));
    }

    let Some(mint) = snapshot.mint else {
        println!("(no on-chain state yet)");
        return;
    };

    println!("Total Available: {}", mint.available);
    println!("Redeemed: {}", mint.redeemed);
    println!("Remaining: {}", mint.remaining);
    println!(
        "{}/{} Minted ({:.2}%)",
        mint.redeemed,
        mint.available,
        mint.percent_minted()
    );

    if snapshot.is_sold_out {
        println!("SOLD OUT");
    } else if let Some(countdown) = format_countdown(mint.go_live_at, Utc::now()) {
        println!("Mint opens in {}", countdown);
    } else {
        println!("Mint is live");
    }

    if let Some(banner) = &snapshot.banner {
        println!("[{:?}] {}", banner.severity, banner.message);
    }
}
