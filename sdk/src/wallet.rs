//! Signer capabilities.
//!
//! Browser-extension wallets expose "sign and submit" with vendor-specific
//! method names and response shapes. Each vendor gets a trait describing its
//! surface, and [`Signer`] is the tagged union the dispatcher branches on:
//!
//! | Variant  | Submission                                   | Response                   |
//! |----------|----------------------------------------------|----------------------------|
//! | `Local`  | encode, sign, submit (three node calls)       | `PendingTransaction`       |
//! | `Petra`  | `sign_and_submit_transaction(payload)`        | `PendingTransaction`       |
//! | `Pontem` | `sign_and_submit(payload)`                    | `{ payload, result: {...} }` |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::account::LocalAccount;
use crate::config::{Network, NetworkDescriptor};
use crate::error::{Result, VrfError};
use crate::types::{AccountAddress, AddressInfo, NetworkInfo, PendingTransaction, TransactionPayload};

/// Error reported by a wallet adapter (user declined, locked wallet...).
pub type WalletError = Box<dyn std::error::Error + Send + Sync>;

/// Extension wallets whose `sign_and_submit_transaction` returns the pending
/// transaction directly.
#[async_trait]
pub trait PetraWallet: Send + Sync {
    async fn connect(&self) -> std::result::Result<AddressInfo, WalletError>;
    async fn is_connected(&self) -> std::result::Result<bool, WalletError>;
    async fn disconnect(&self) -> std::result::Result<(), WalletError>;
    async fn account(&self) -> std::result::Result<AddressInfo, WalletError>;
    /// Network name, e.g. `Testnet`.
    async fn network(&self) -> std::result::Result<String, WalletError>;
    async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> std::result::Result<PendingTransaction, WalletError>;
}

/// Response of [`PontemWallet::sign_and_submit`]: the payload as the wallet
/// submitted it, and the pending transaction nested under `result`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PontemResponse {
    pub payload: TransactionPayload,
    pub result: PendingTransaction,
}

/// Extension wallets whose `sign_and_submit` nests the transaction.
#[async_trait]
pub trait PontemWallet: Send + Sync {
    async fn connect(&self) -> std::result::Result<(), WalletError>;
    async fn is_connected(&self) -> std::result::Result<bool, WalletError>;
    async fn disconnect(&self) -> std::result::Result<(), WalletError>;
    /// Address literal of the connected account.
    async fn account(&self) -> std::result::Result<String, WalletError>;
    async fn network(&self) -> std::result::Result<NetworkInfo, WalletError>;
    async fn sign_and_submit(
        &self,
        payload: &TransactionPayload,
    ) -> std::result::Result<PontemResponse, WalletError>;
}

/// The signer a transaction is dispatched through.
#[derive(Clone, Copy)]
pub enum Signer<'a> {
    Local(&'a LocalAccount),
    Petra(&'a dyn PetraWallet),
    Pontem(&'a dyn PontemWallet),
}

impl<'a> Signer<'a> {
    pub fn kind(&self) -> &'static str {
        match self {
            Signer::Local(_) => "local",
            Signer::Petra(_) => "petra",
            Signer::Pontem(_) => "pontem",
        }
    }

    /// Address that owns requests made through this signer.
    pub async fn address(&self) -> Result<AccountAddress> {
        match self {
            Signer::Local(account) => Ok(account.address()),
            Signer::Petra(wallet) => {
                let info = wallet.account().await.map_err(wallet_unavailable)?;
                AccountAddress::from_hex_literal(&info.address)
            }
            Signer::Pontem(wallet) => {
                let address = wallet.account().await.map_err(wallet_unavailable)?;
                AccountAddress::from_hex_literal(&address)
            }
        }
    }

    /// Network the signer is connected to. A local keypair has no network
    /// of its own and reports `configured`.
    pub async fn network(&self, configured: &NetworkDescriptor) -> Result<NetworkDescriptor> {
        match self {
            Signer::Local(_) => Ok(configured.clone()),
            Signer::Petra(wallet) => {
                let name = wallet.network().await.map_err(wallet_unavailable)?;
                Ok(Network::from_name(&name).descriptor())
            }
            Signer::Pontem(wallet) => {
                let info = wallet.network().await.map_err(wallet_unavailable)?;
                Ok(info.into())
            }
        }
    }
}

impl std::fmt::Debug for Signer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signer::Local(account) => f.debug_tuple("Local").field(account).finish(),
            Signer::Petra(_) => f.write_str("Petra"),
            Signer::Pontem(_) => f.write_str("Pontem"),
        }
    }
}

impl<'a> From<&'a LocalAccount> for Signer<'a> {
    fn from(account: &'a LocalAccount) -> Self {
        Signer::Local(account)
    }
}

/// Wallet failures outside submission mean the extension is not reachable.
fn wallet_unavailable(err: WalletError) -> VrfError {
    VrfError::NetworkUnavailable(format!("wallet: {err}"))
}
