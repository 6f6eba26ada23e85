//! Demo configuration loaded from environment variables.
//!
//! All optional: `APTOS_NETWORK`, `APTOS_NODE_URL`, `APTOS_FAUCET_URL`,
//!               `APTOS_PRIVATE_KEY`, `APTOS_PRIVATE_KEY_PATH`,
//!               `ORACLE_VERSION`, `ORACLE_ADDRESS`, `FUND_AMOUNT`,
//!               `REQUEST_COUNT`, `POLL_INTERVAL_MS`, `WAIT_TIMEOUT_SECS`

use anyhow::{Context, Result};
use orao_aptos_vrf::{AccountAddress, LocalAccount, Network, OracleConfig, OracleVersion, WaitOptions};
use std::time::Duration;

/// Where the requesting key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Hex key from `APTOS_PRIVATE_KEY`.
    Env(String),
    /// File holding a hex key, from `APTOS_PRIVATE_KEY_PATH` (tilde-expanded).
    File(String),
    /// Fresh keypair, funded from the faucet before use.
    Generate,
}

/// Configuration for one demo run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub network: Network,
    /// Fullnode REST endpoint.
    pub node_url: String,
    /// Faucet endpoint; `None` on networks without one.
    pub faucet_url: Option<String>,
    pub key_source: KeySource,
    pub oracle: OracleConfig,
    /// Octas requested from the faucet for a generated account.
    pub fund_amount: u64,
    /// Number of seeds requested concurrently.
    pub request_count: usize,
    pub wait: WaitOptions,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let network = Network::from_name(&var("APTOS_NETWORK").unwrap_or_else(|| "devnet".into()));
        let node_url = var("APTOS_NODE_URL").unwrap_or_else(|| network.node_url().into());
        let faucet_url = var("APTOS_FAUCET_URL").or_else(|| network.faucet_url().map(Into::into));

        let key_source = match (var("APTOS_PRIVATE_KEY"), var("APTOS_PRIVATE_KEY_PATH")) {
            (Some(key), _) => KeySource::Env(key),
            (None, Some(path)) => KeySource::File(shellexpand::tilde(&path).to_string()),
            (None, None) => KeySource::Generate,
        };

        let version = match var("ORACLE_VERSION") {
            Some(name) => OracleVersion::from_name(&name)
                .with_context(|| format!("invalid ORACLE_VERSION: {name}"))?,
            None => OracleVersion::V2,
        };
        let mut oracle = OracleConfig::new(version);
        if let Some(address) = var("ORACLE_ADDRESS") {
            let address = AccountAddress::from_hex_literal(&address)
                .with_context(|| format!("invalid ORACLE_ADDRESS: {address}"))?;
            oracle = oracle.with_address(address);
        }

        let fund_amount = var("FUND_AMOUNT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(100_000_000);

        let request_count = var("REQUEST_COUNT")
            .and_then(|v| v.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(1);

        let poll_interval_ms = var("POLL_INTERVAL_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1000);

        let wait_timeout_secs: u64 = var("WAIT_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        Ok(Self {
            network,
            node_url,
            faucet_url,
            key_source,
            oracle,
            fund_amount,
            request_count,
            wait: WaitOptions {
                poll_interval: Duration::from_millis(poll_interval_ms),
                // 0 waits without bound.
                timeout: (wait_timeout_secs > 0).then(|| Duration::from_secs(wait_timeout_secs)),
            },
        })
    }

    /// Load or generate the requesting account.
    pub fn load_account(&self) -> Result<LocalAccount> {
        match &self.key_source {
            KeySource::Env(key) => Ok(LocalAccount::from_private_key_hex(key)?),
            KeySource::File(path) => {
                let key = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read private key from {path}"))?;
                LocalAccount::from_private_key_hex(&key)
                    .with_context(|| format!("invalid private key in {path}"))
            }
            KeySource::Generate => Ok(LocalAccount::generate()),
        }
    }

    /// Return the Aptos explorer URL for a given transaction hash.
    pub fn explorer_url(&self, hash: &str) -> String {
        format!(
            "https://explorer.aptoslabs.com/txn/{hash}?network={}",
            self.network.name().to_lowercase()
        )
    }
}
