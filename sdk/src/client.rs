//! High-level client bundling every component for one oracle deployment.

use std::sync::Arc;

use crate::cancel::CancelSignal;
use crate::config::{Network, OracleConfig, OracleVersion, TransactionOptions, WaitOptions};
use crate::dispatcher::{Dispatcher, SubmissionResult};
use crate::error::Result;
use crate::payload::{Callback, Operation, PayloadBuilder};
use crate::reader::{OracleState, RandomnessReader};
use crate::rpc::{LedgerRpc, RestClient};
use crate::types::{AccountAddress, Randomness, Seed};
use crate::waiter::FulfillmentWaiter;
use crate::wallet::Signer;

/// Oracle client.
///
/// ```no_run
/// # async fn run() -> orao_aptos_vrf::Result<()> {
/// use orao_aptos_vrf::{CancelSignal, LocalAccount, OraoVrf, OracleVersion, Signer};
///
/// let vrf = OraoVrf::new("https://fullnode.devnet.aptoslabs.com", OracleVersion::V2)?;
/// let account = LocalAccount::from_env()?;
///
/// let submitted = vrf.request(Signer::Local(&account), None).await?;
/// if let Some(seed) = submitted.seed {
///     let randomness = vrf
///         .await_fulfillment(account.address(), &seed, &CancelSignal::new())
///         .await?;
///     println!("{randomness}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct OraoVrf<R = RestClient> {
    rpc: Arc<R>,
    builder: PayloadBuilder,
    dispatcher: Dispatcher<R>,
    reader: Arc<RandomnessReader<R>>,
    waiter: FulfillmentWaiter<RandomnessReader<R>>,
}

impl OraoVrf<RestClient> {
    /// Client for the default deployment of `version`, talking to `node_url`.
    pub fn new(node_url: &str, version: OracleVersion) -> Result<Self> {
        let rpc = Arc::new(RestClient::new(node_url)?);
        Ok(Self::with_config(
            rpc,
            OracleConfig::new(version),
            TransactionOptions::default(),
            WaitOptions::default(),
        ))
    }

    /// Client for the public node of `network`.
    pub fn for_network(network: Network, version: OracleVersion) -> Result<Self> {
        Self::new(network.node_url(), version)
    }
}

impl<R: LedgerRpc> OraoVrf<R> {
    pub fn with_config(
        rpc: Arc<R>,
        config: OracleConfig,
        transaction: TransactionOptions,
        wait: WaitOptions,
    ) -> Self {
        let reader = Arc::new(RandomnessReader::new(Arc::clone(&rpc), config.clone()));
        Self {
            builder: PayloadBuilder::new(config),
            dispatcher: Dispatcher::new(Arc::clone(&rpc), transaction),
            waiter: FulfillmentWaiter::new(Arc::clone(&reader), wait),
            reader,
            rpc,
        }
    }

    pub fn config(&self) -> &OracleConfig {
        self.builder.config()
    }

    pub fn rpc(&self) -> &Arc<R> {
        &self.rpc
    }

    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    pub fn dispatcher(&self) -> &Dispatcher<R> {
        &self.dispatcher
    }

    pub fn reader(&self) -> &RandomnessReader<R> {
        &self.reader
    }

    pub fn waiter(&self) -> &FulfillmentWaiter<RandomnessReader<R>> {
        &self.waiter
    }

    /// Chain id reported by the node.
    pub async fn chain_id(&self) -> Result<u8> {
        Ok(self.rpc.ledger_info().await?.chain_id)
    }

    /// Request randomness; a random seed is generated when `seed` is `None`.
    pub async fn request(&self, signer: Signer<'_>, seed: Option<Seed>) -> Result<SubmissionResult> {
        let seed = seed.unwrap_or_else(Seed::random);
        self.execute(&Operation::Request { seed }, signer).await
    }

    pub async fn request_with_callback(
        &self,
        signer: Signer<'_>,
        seed: Option<Seed>,
        callback: Callback,
    ) -> Result<SubmissionResult> {
        let seed = seed.unwrap_or_else(Seed::random);
        self.execute(&Operation::RequestWithCallback { seed, callback }, signer)
            .await
    }

    /// Top up the signer's treasury balance.
    pub async fn deposit(&self, signer: Signer<'_>, coin_type: &str, amount: u64) -> Result<SubmissionResult> {
        let operation = Operation::Deposit {
            coin_type: coin_type.to_string(),
            amount,
        };
        self.execute(&operation, signer).await
    }

    /// Top up `recipient`'s treasury balance, paid by the signer.
    pub async fn deposit_for_user(
        &self,
        signer: Signer<'_>,
        coin_type: &str,
        recipient: AccountAddress,
        amount: u64,
    ) -> Result<SubmissionResult> {
        let operation = Operation::DepositForUser {
            coin_type: coin_type.to_string(),
            recipient,
            amount,
        };
        self.execute(&operation, signer).await
    }

    pub async fn withdraw(&self, signer: Signer<'_>, coin_type: &str, amount: u64) -> Result<SubmissionResult> {
        let operation = Operation::Withdraw {
            coin_type: coin_type.to_string(),
            amount,
        };
        self.execute(&operation, signer).await
    }

    pub async fn read_randomness(&self, owner: AccountAddress, seed: &Seed) -> Result<Option<Randomness>> {
        self.reader.read_randomness(owner, seed).await
    }

    pub async fn await_fulfillment(
        &self,
        owner: AccountAddress,
        seed: &Seed,
        cancel: &CancelSignal,
    ) -> Result<Randomness> {
        self.waiter.await_fulfillment(owner, seed, cancel).await
    }

    pub async fn network_state(&self) -> Result<OracleState> {
        self.reader.network_state().await
    }

    pub async fn balance(&self, coin_type: &str, owner: AccountAddress) -> Result<u64> {
        self.reader.balance(coin_type, owner).await
    }

    async fn execute(&self, operation: &Operation, signer: Signer<'_>) -> Result<SubmissionResult> {
        let payload = self.builder.build(operation)?;
        self.dispatcher.submit(&payload, signer).await
    }
}
