//! Ledger RPC: the operations the SDK needs from a full node, and a REST
//! implementation of them.
//!
//! Components take any [`LedgerRpc`] so they can be driven by an in-memory
//! stub in tests. [`RestClient`] talks to the node's JSON API:
//!
//! ```text
//! GET  /v1/                                  ledger info (chain id)
//! GET  /v1/accounts/{addr}                   sequence number
//! GET  /v1/accounts/{addr}/resource/{type}   resource by type name
//! POST /v1/tables/{handle}/item              keyed table lookup
//! POST /v1/transactions/encode_submission    signing message
//! POST /v1/transactions                      submit signed transaction
//! GET  /v1/transactions/by_hash/{hash}       inclusion status
//! POST /v1/view                              read-only view call
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Result, VrfError};
use crate::types::{AccountAddress, PendingTransaction, TransactionPayload, TransactionSignature};

/// HTTP request timeout for node calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between inclusion checks while waiting for a transaction.
pub const TRANSACTION_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Subset of the ledger info returned by the index endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    #[serde(default)]
    pub ledger_version: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccountInfo {
    #[serde(deserialize_with = "u64_from_string")]
    pub sequence_number: u64,
    #[serde(default)]
    pub authentication_key: String,
}

/// Body of a table lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableItemRequest {
    pub key_type: String,
    pub value_type: String,
    pub key: Value,
}

/// A user transaction as sent for encoding (unsigned) or submission (signed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRequest {
    pub sender: AccountAddress,
    pub sequence_number: String,
    pub max_gas_amount: String,
    pub gas_unit_price: String,
    pub expiration_timestamp_secs: String,
    pub payload: TransactionPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<TransactionSignature>,
}

/// Inclusion status of a transaction looked up by hash.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransactionInfo {
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub vm_status: Option<String>,
}

impl TransactionInfo {
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }

    /// Turn a committed transaction into an error if the chain rejected it.
    pub fn into_committed(self) -> Result<Self> {
        if self.success == Some(false) {
            return Err(VrfError::TransactionFailed {
                hash: self.hash,
                vm_status: self.vm_status.unwrap_or_else(|| "unknown".into()),
            });
        }
        Ok(self)
    }
}

/// Body of a view function call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewRequest {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}

/// The ledger operations the SDK consumes.
#[async_trait]
pub trait LedgerRpc: Send + Sync {
    async fn ledger_info(&self) -> Result<LedgerInfo>;

    async fn account(&self, address: AccountAddress) -> Result<AccountInfo>;

    /// The `data` object of a resource stored under `address`.
    async fn resource(&self, address: AccountAddress, resource_type: &str) -> Result<Value>;

    async fn table_item(&self, handle: &str, request: &TableItemRequest) -> Result<Value>;

    /// Signing message for an unsigned submission.
    async fn encode_submission(&self, request: &SubmissionRequest) -> Result<Vec<u8>>;

    async fn submit_transaction(&self, request: &SubmissionRequest) -> Result<PendingTransaction>;

    /// `None` while the node does not know the hash yet.
    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionInfo>>;

    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>>;

    /// Poll until the transaction leaves the mempool, then report whether it
    /// succeeded.
    async fn wait_for_transaction(&self, hash: &str, timeout: Duration) -> Result<TransactionInfo> {
        let wait = async {
            let mut ticker = tokio::time::interval(TRANSACTION_POLL_INTERVAL);
            loop {
                ticker.tick().await;
                match self.transaction_by_hash(hash).await? {
                    Some(txn) if !txn.is_pending() => return txn.into_committed(),
                    _ => debug!(hash, "Transaction pending"),
                }
            }
        };

        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| VrfError::Timeout(timeout))?
    }
}

/// Which kind of call failed, for mapping client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    Read,
    Submit,
}

/// Error body returned by the node.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    error_code: Option<String>,
}

/// Map a non-success response onto the SDK taxonomy.
fn classify(status: StatusCode, body: &str, kind: CallKind) -> VrfError {
    let (message, code) = match serde_json::from_str::<ApiError>(body) {
        Ok(err) => (err.message, err.error_code),
        Err(_) => (body.to_string(), None),
    };
    let detail = match code {
        Some(code) => format!("{code}: {message}"),
        None => message,
    };

    if status == StatusCode::NOT_FOUND {
        VrfError::RecordNotFound(detail)
    } else if status.is_client_error() && kind == CallKind::Submit {
        VrfError::SubmissionRejected(detail)
    } else {
        VrfError::NetworkUnavailable(format!("{status}: {detail}"))
    }
}

/// Decode a successful body into `T`, or map the status onto an error.
fn parse_response<T: DeserializeOwned>(status: StatusCode, body: &str, kind: CallKind) -> Result<T> {
    if !status.is_success() {
        return Err(classify(status, body, kind));
    }
    serde_json::from_str(body)
        .map_err(|e| VrfError::NetworkUnavailable(format!("failed to parse node response: {e}")))
}

/// Lookups where "not found" is an expected state rather than an error.
fn found<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(VrfError::RecordNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Envelope of a resource read; only `data` is used.
#[derive(Debug, Deserialize)]
struct Resource {
    data: Value,
}

fn decode_signing_message(message: &str) -> Result<Vec<u8>> {
    hex::decode(message.trim_start_matches("0x"))
        .map_err(|e| VrfError::NetworkUnavailable(format!("malformed signing message: {e}")))
}

fn u64_from_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

/// [`LedgerRpc`] over a full node's REST API.
#[derive(Clone)]
pub struct RestClient {
    base: Url,
    http: reqwest::Client,
}

impl RestClient {
    /// Create a client for `node_url`. The `/v1` API prefix is appended when
    /// the URL does not already end with it.
    pub fn new(node_url: &str) -> Result<Self> {
        let mut base = node_url.trim_end_matches('/').to_string();
        if !base.ends_with("/v1") {
            base.push_str("/v1");
        }
        base.push('/');
        let base = Url::parse(&base)
            .map_err(|e| VrfError::InvalidArgument(format!("invalid node URL {node_url:?}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| VrfError::NetworkUnavailable(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { base, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| VrfError::InvalidArgument(format!("invalid request path {path:?}: {e}")))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        Self::decode(response, CallKind::Read).await
    }

    async fn post<B, T>(&self, path: &str, body: &B, kind: CallKind) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.http.post(url).json(body).send().await?;
        Self::decode(response, kind).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, kind: CallKind) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        parse_response(status, &body, kind)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient").field("base", &self.base.as_str()).finish()
    }
}

#[async_trait]
impl LedgerRpc for RestClient {
    async fn ledger_info(&self) -> Result<LedgerInfo> {
        self.get("").await
    }

    async fn account(&self, address: AccountAddress) -> Result<AccountInfo> {
        self.get(&format!("accounts/{address}")).await
    }

    async fn resource(&self, address: AccountAddress, resource_type: &str) -> Result<Value> {
        let resource: Resource = self
            .get(&format!("accounts/{address}/resource/{resource_type}"))
            .await?;
        Ok(resource.data)
    }

    async fn table_item(&self, handle: &str, request: &TableItemRequest) -> Result<Value> {
        self.post(&format!("tables/{handle}/item"), request, CallKind::Read)
            .await
    }

    async fn encode_submission(&self, request: &SubmissionRequest) -> Result<Vec<u8>> {
        let message: String = self
            .post("transactions/encode_submission", request, CallKind::Submit)
            .await?;
        decode_signing_message(&message)
    }

    async fn submit_transaction(&self, request: &SubmissionRequest) -> Result<PendingTransaction> {
        self.post("transactions", request, CallKind::Submit).await
    }

    async fn transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionInfo>> {
        found(self.get(&format!("transactions/by_hash/{hash}")).await)
    }

    async fn view(&self, request: &ViewRequest) -> Result<Vec<Value>> {
        self.post("view", request, CallKind::Read).await
    }
}
