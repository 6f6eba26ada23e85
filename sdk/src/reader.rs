//! Randomness Store Reader.
//!
//! Each requesting account holds a store resource whose table maps
//! `seed -> randomness`. The oracle inserts the seed with an empty value when
//! the request lands and writes the randomness exactly once on fulfillment.
//!
//! Outcomes of a read:
//!
//! - value non-empty: fulfilled, `Some(randomness)`;
//! - value empty: requested but not fulfilled yet, `None`;
//! - account, store resource or table entry missing: `RecordNotFound`.
//!
//! The empty value is the one canonical "not yet fulfilled" sentinel: the
//! node may render it as the empty hex string `"0x"` or as an empty array,
//! and both decode to a zero-length byte vector.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::OracleConfig;
use crate::error::{Result, VrfError};
use crate::rpc::{LedgerRpc, TableItemRequest, ViewRequest};
use crate::types::{AccountAddress, Randomness, Seed, bytes_from_json};

const BYTES_TYPE: &str = "vector<u8>";

/// Anything that can report the fulfillment state of a seed.
#[async_trait]
pub trait RandomnessSource: Send + Sync {
    /// `Ok(None)` while the request is pending.
    async fn read_randomness(&self, owner: AccountAddress, seed: &Seed) -> Result<Option<Randomness>>;
}

/// Oracle-wide state: the coin fees are paid in, the fee and its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OracleState {
    pub coin_type: String,
    pub fee: String,
    pub treasury: String,
}

/// Reads randomness records and oracle state through a [`LedgerRpc`].
pub struct RandomnessReader<R> {
    rpc: Arc<R>,
    config: OracleConfig,
}

impl<R: LedgerRpc> RandomnessReader<R> {
    pub fn new(rpc: Arc<R>, config: OracleConfig) -> Self {
        Self { rpc, config }
    }

    /// Handle of the `owner`'s randomness table.
    pub async fn table_handle(&self, owner: AccountAddress) -> Result<String> {
        let resource_type = self.config.resource_type(&self.config.store.resource);
        let data = self.rpc.resource(owner, &resource_type).await?;

        let handle = self
            .config
            .store
            .handle_path
            .iter()
            .try_fold(&data, |value, field| value.get(field))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                VrfError::NetworkUnavailable(format!(
                    "{resource_type} has no table handle at `{}`",
                    self.config.store.handle_path.join(".")
                ))
            })?;
        Ok(handle.to_string())
    }

    /// Fulfillment state of `seed` requested by `owner`.
    pub async fn read_randomness(
        &self,
        owner: AccountAddress,
        seed: &Seed,
    ) -> Result<Option<Randomness>> {
        let handle = self.table_handle(owner).await?;
        let request = TableItemRequest {
            key_type: BYTES_TYPE.to_string(),
            value_type: BYTES_TYPE.to_string(),
            key: Value::String(seed.to_hex()),
        };
        let value = self.rpc.table_item(&handle, &request).await?;

        let bytes = bytes_from_json(&value).ok_or_else(|| {
            VrfError::NetworkUnavailable(format!("randomness is not a byte vector: {value}"))
        })?;
        debug!(%owner, %seed, fulfilled = !bytes.is_empty(), "Read randomness");

        if bytes.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Randomness::new(bytes)))
        }
    }

    /// Global oracle state resource.
    pub async fn network_state(&self) -> Result<OracleState> {
        let resource_type = self.config.resource_type(&self.config.state_resource);
        let data = self.rpc.resource(self.config.address, &resource_type).await?;
        serde_json::from_value(data).map_err(|e| {
            VrfError::NetworkUnavailable(format!("unexpected {resource_type} layout: {e}"))
        })
    }

    /// Balance of `owner` in the oracle treasury for `coin_type`. Accounts
    /// that never deposited read as zero.
    pub async fn balance(&self, coin_type: &str, owner: AccountAddress) -> Result<u64> {
        if !self.config.version.supports_treasury() {
            return Err(VrfError::InvalidArgument(format!(
                "oracle {:?} has no treasury",
                self.config.version
            )));
        }
        let request = ViewRequest {
            function: self.config.function_id("get_balance"),
            type_arguments: vec![coin_type.to_string()],
            arguments: vec![Value::String(owner.to_hex_literal())],
        };
        let values = self.rpc.view(&request).await?;

        Ok(match values.first() {
            Some(Value::String(amount)) => amount.parse().map_err(|e| {
                VrfError::NetworkUnavailable(format!("balance is not a u64: {amount:?}: {e}"))
            })?,
            Some(Value::Number(amount)) => amount.as_u64().ok_or_else(|| {
                VrfError::NetworkUnavailable(format!("balance is not a u64: {amount}"))
            })?,
            _ => 0,
        })
    }
}

#[async_trait]
impl<R: LedgerRpc> RandomnessSource for RandomnessReader<R> {
    async fn read_randomness(&self, owner: AccountAddress, seed: &Seed) -> Result<Option<Randomness>> {
        RandomnessReader::read_randomness(self, owner, seed).await
    }
}
