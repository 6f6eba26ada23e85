//! Error taxonomy shared by every SDK component.

use std::time::Duration;

use thiserror::Error;

use crate::types::Seed;

/// Errors returned by payload building, dispatch, store reads and waits.
#[derive(Debug, Error)]
pub enum VrfError {
    /// Malformed caller input (seed length, zero amount, bad type tag...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The signer declined or failed before the transaction reached the chain.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// The transaction was included but the chain reported failure.
    #[error("transaction {hash} failed: {vm_status}")]
    TransactionFailed { hash: String, vm_status: String },

    /// The signer or node accepted the transaction, but its inclusion could
    /// not be confirmed. It may still land; `seed` identifies the randomness
    /// record it would create.
    #[error("transaction {hash} submitted but not confirmed: {source}")]
    Unconfirmed {
        hash: String,
        seed: Option<Seed>,
        source: Box<VrfError>,
    },

    /// The RPC call itself failed (transport error, 5xx, unexpected body).
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// The account, resource or table entry does not exist.
    #[error("record not found: {0}")]
    RecordNotFound(String),

    /// A bounded wait elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The caller abandoned the wait.
    #[error("cancelled")]
    Cancelled,
}

impl VrfError {
    /// Whether repeating the same call could succeed without caller changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, VrfError::NetworkUnavailable(_))
    }
}

impl From<reqwest::Error> for VrfError {
    fn from(err: reqwest::Error) -> Self {
        VrfError::NetworkUnavailable(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, VrfError>;
