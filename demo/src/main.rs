//! VRF demo
//!
//! Requests verifiable randomness from the oracle and waits for it:
//!
//! - **Account**: loaded from the environment, or generated and funded
//!   from the network faucet.
//! - **Treasury**: on oracles that charge from a treasury balance, tops the
//!   balance up to cover every request of the run.
//! - **Requests**: submits `REQUEST_COUNT` random seeds one after another
//!   (they share a sequence number space), then waits for all of them
//!   concurrently. Ctrl-C cancels the outstanding waits.

use anyhow::{Context, Result};
use futures_util::future::join_all;
use orao_aptos_vrf::{
    AccountAddress, CancelSignal, LocalAccount, OraoVrf, RestClient, Seed, Signer,
    TransactionOptions, VrfError,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod config;
mod faucet;
mod stats;

use config::{AppConfig, KeySource};
use faucet::FaucetClient;
use stats::Stats;

/// A request that made it on chain.
struct Submitted {
    seed: Seed,
    hash: String,
    at: Instant,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_target(true)
        .with_ansi(true)
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let account = config.load_account()?;

    info!(
        oracle = %config.oracle.address,
        version = ?config.oracle.version,
        account = %account.address(),
        "Starting VRF demo"
    );

    let rpc = Arc::new(RestClient::new(&config.node_url)?);
    let vrf = OraoVrf::with_config(
        Arc::clone(&rpc),
        config.oracle.clone(),
        TransactionOptions::default(),
        config.wait,
    );
    let chain_id = vrf.chain_id().await.context("node unreachable")?;
    info!(node = %config.node_url, chain_id, network = config.network.name(), "Endpoints configured");

    if config.key_source == KeySource::Generate {
        let faucet_url = config
            .faucet_url
            .as_deref()
            .context("no faucet for this network; set APTOS_PRIVATE_KEY")?;
        FaucetClient::new(faucet_url)?
            .fund(rpc.as_ref(), account.address(), config.fund_amount)
            .await
            .context("failed to fund the generated account")?;
    }

    if config.oracle.version.supports_treasury() {
        ensure_treasury_balance(&vrf, &account, config.request_count).await?;
    }

    let cancel = CancelSignal::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling outstanding waits");
                cancel.cancel();
            }
        }
    });

    let stats = Stats::new();
    let mut submitted = Vec::with_capacity(config.request_count);
    for _ in 0..config.request_count {
        if cancel.is_cancelled() {
            break;
        }
        match vrf.request(Signer::Local(&account), None).await {
            Ok(result) => {
                stats.record_submission();
                let Some(seed) = result.seed else {
                    stats.record_failure();
                    continue;
                };
                info!(%seed, explorer = %config.explorer_url(&result.hash), "Randomness requested");
                submitted.push(Submitted {
                    seed,
                    hash: result.hash,
                    at: Instant::now(),
                });
            }
            Err(VrfError::Unconfirmed {
                hash,
                seed: Some(seed),
                source,
            }) => {
                // May still land; the wait below resolves it either way.
                stats.record_submission();
                warn!(%seed, %hash, error = %source, "Request not confirmed, waiting for randomness anyway");
                submitted.push(Submitted {
                    seed,
                    hash,
                    at: Instant::now(),
                });
            }
            Err(e) => {
                error!(error = %e, "Request failed");
                stats.record_failure();
            }
        }
    }

    let owner = account.address();
    join_all(
        submitted
            .iter()
            .map(|request| wait_one(&vrf, owner, request, &cancel, &stats)),
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&stats.to_json())?);
    Ok(())
}

/// Deposit enough into the treasury to pay for `requests` requests.
async fn ensure_treasury_balance(vrf: &OraoVrf, account: &LocalAccount, requests: usize) -> Result<()> {
    let state = vrf.network_state().await.context("failed to read oracle state")?;
    let fee: u64 = state
        .fee
        .parse()
        .with_context(|| format!("unexpected oracle fee: {}", state.fee))?;
    let balance = vrf.balance(&state.coin_type, account.address()).await?;
    let needed = fee.saturating_mul(requests as u64);
    info!(coin = %state.coin_type, fee, balance, needed, "Treasury balance");

    if balance < needed {
        let result = vrf
            .deposit(Signer::Local(account), &state.coin_type, needed - balance)
            .await
            .context("treasury deposit failed")?;
        info!(hash = %result.hash, amount = needed - balance, "Treasury topped up");
    }
    Ok(())
}

async fn wait_one(
    vrf: &OraoVrf,
    owner: AccountAddress,
    request: &Submitted,
    cancel: &CancelSignal,
    stats: &Stats,
) {
    match vrf.await_fulfillment(owner, &request.seed, cancel).await {
        Ok(randomness) => {
            stats.record_fulfillment(request.at.elapsed());
            info!(seed = %request.seed, %randomness, "Randomness fulfilled");
        }
        Err(VrfError::Cancelled) => {
            stats.record_cancellation();
            warn!(seed = %request.seed, hash = %request.hash, "Wait cancelled");
        }
        Err(e) => {
            stats.record_failure();
            error!(seed = %request.seed, hash = %request.hash, error = %e, "Fulfillment failed");
        }
    }
}
