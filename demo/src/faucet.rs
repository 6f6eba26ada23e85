//! Test-network faucet client.

use anyhow::{Context, Result};
use orao_aptos_vrf::{AccountAddress, LedgerRpc};
use reqwest::Url;
use std::time::Duration;
use tracing::info;

const FUNDING_TIMEOUT: Duration = Duration::from_secs(30);

pub struct FaucetClient {
    base: Url,
    http: reqwest::Client,
}

impl FaucetClient {
    pub fn new(faucet_url: &str) -> Result<Self> {
        let base = Url::parse(faucet_url).with_context(|| format!("invalid faucet URL: {faucet_url}"))?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    fn mint_url(&self, address: AccountAddress, amount: u64) -> Result<Url> {
        let mut url = self.base.join("mint")?;
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string())
            .append_pair("address", &address.to_hex_literal());
        Ok(url)
    }

    /// Mint `amount` octas to `address` and wait until the funding
    /// transactions are committed.
    pub async fn fund(&self, rpc: &impl LedgerRpc, address: AccountAddress, amount: u64) -> Result<()> {
        let url = self.mint_url(address, amount)?;
        let hashes: Vec<String> = self
            .http
            .post(url)
            .send()
            .await
            .context("faucet unreachable")?
            .error_for_status()
            .context("faucet refused to fund the account")?
            .json()
            .await
            .context("unexpected faucet response")?;

        for hash in &hashes {
            rpc.wait_for_transaction(hash, FUNDING_TIMEOUT)
                .await
                .with_context(|| format!("funding transaction {hash} did not land"))?;
        }
        info!(%address, amount, transactions = hashes.len(), "Account funded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_url_carries_amount_and_address() {
        let faucet = FaucetClient::new("https://faucet.devnet.aptoslabs.com").unwrap();
        let address = AccountAddress::from_hex_literal("0x1").unwrap();
        let url = faucet.mint_url(address, 100_000_000).unwrap();

        assert_eq!(url.path(), "/mint");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("amount".to_string(), "100000000".to_string()),
                ("address".to_string(), address.to_hex_literal()),
            ]
        );
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(FaucetClient::new("not a url").is_err());
    }
}
