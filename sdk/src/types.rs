//! Ledger primitives: addresses, seeds, randomness and the JSON shapes
//! exchanged with the node and with wallet adapters.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Result, VrfError};

/// Length of a seed and of an account address in bytes.
pub const SEED_LEN: usize = 32;
const ADDRESS_LEN: usize = 32;

/// A 32-byte ledger account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ADDRESS_LEN]);

impl AccountAddress {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Parse a hex literal. The `0x` prefix is optional and short forms are
    /// left-padded with zeros, so `0x1` is the framework address.
    pub fn from_hex_literal(literal: &str) -> Result<Self> {
        let digits = literal.strip_prefix("0x").unwrap_or(literal);
        if digits.is_empty() || digits.len() > ADDRESS_LEN * 2 {
            return Err(VrfError::InvalidArgument(format!(
                "invalid account address: {literal:?}"
            )));
        }
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(&padded, &mut bytes).map_err(|e| {
            VrfError::InvalidArgument(format!("invalid account address {literal:?}: {e}"))
        })?;
        Ok(Self(bytes))
    }

    /// Full `0x`-prefixed 64-digit form.
    pub fn to_hex_literal(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex_literal())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountAddress({})", self.to_hex_literal())
    }
}

impl FromStr for AccountAddress {
    type Err = VrfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex_literal(s)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_literal())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        Self::from_hex_literal(&literal).map_err(serde::de::Error::custom)
    }
}

/// Caller-chosen entropy identifying one randomness request per account.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed([u8; SEED_LEN]);

impl Seed {
    pub const fn new(bytes: [u8; SEED_LEN]) -> Self {
        Self(bytes)
    }

    /// Fresh seed from the OS random number generator.
    pub fn random() -> Self {
        let mut bytes = [0u8; SEED_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }

    /// `0x`-prefixed hex, the form used as a function argument and table key.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse a seed echoed back inside a JSON payload: either a hex string
    /// or an array of byte values.
    pub fn from_json(value: &Value) -> Result<Self> {
        let bytes = bytes_from_json(value).ok_or_else(|| {
            VrfError::InvalidArgument(format!("seed is not a byte vector: {value}"))
        })?;
        Self::try_from(bytes.as_slice())
    }
}

impl TryFrom<&[u8]> for Seed {
    type Error = VrfError;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        let array: [u8; SEED_LEN] = bytes.try_into().map_err(|_| {
            VrfError::InvalidArgument(format!(
                "seed must be {SEED_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }
}

impl FromStr for Seed {
    type Err = VrfError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| VrfError::InvalidArgument(format!("invalid seed hex: {e}")))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self.to_hex())
    }
}

/// Randomness published by the oracle for a fulfilled seed.
#[derive(Clone, PartialEq, Eq)]
pub struct Randomness(Vec<u8>);

impl Randomness {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl fmt::Display for Randomness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Randomness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Randomness({})", self.to_hex())
    }
}

/// Decode a `vector<u8>` as the node or a wallet renders it in JSON.
///
/// Accepts a hex string (`"0x..."` or bare digits) or an array of integers
/// in `0..=255`. Anything else yields `None`.
pub(crate) fn bytes_from_json(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok(),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
            .collect(),
        _ => None,
    }
}

fn entry_function_kind() -> String {
    TransactionPayload::ENTRY_FUNCTION.to_string()
}

/// An entry-function call: target, type arguments and JSON-encoded arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    #[serde(rename = "type", default = "entry_function_kind")]
    pub kind: String,
    /// `address::module::function`.
    pub function: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl TransactionPayload {
    pub const ENTRY_FUNCTION: &'static str = "entry_function_payload";

    pub fn entry_function(
        function: String,
        type_arguments: Vec<String>,
        arguments: Vec<Value>,
    ) -> Self {
        Self {
            kind: entry_function_kind(),
            function,
            type_arguments,
            arguments,
        }
    }

    /// Name of the called function, without its module path.
    pub fn function_name(&self) -> &str {
        self.function.rsplit("::").next().unwrap_or(&self.function)
    }

    /// The seed argument of a request payload, if this is one.
    pub fn seed(&self) -> Option<Seed> {
        match self.function_name() {
            "request" | "request_with_callback" => {
                self.arguments.first().and_then(|v| Seed::from_json(v).ok())
            }
            _ => None,
        }
    }
}

/// Signature attached to a submitted transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionSignature {
    #[serde(rename = "type")]
    pub kind: String,
    pub public_key: String,
    pub signature: String,
}

/// A transaction accepted into the mempool, as returned by the node and by
/// extension wallets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub hash: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub sequence_number: String,
    #[serde(default)]
    pub max_gas_amount: String,
    #[serde(default)]
    pub gas_unit_price: String,
    #[serde(default)]
    pub expiration_timestamp_secs: String,
    #[serde(default)]
    pub payload: Option<TransactionPayload>,
    #[serde(default)]
    pub signature: Option<TransactionSignature>,
}

/// Account details reported by a connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInfo {
    pub address: String,
    pub public_key: String,
}

/// Network details reported by wallets that expose the full descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub api: String,
    pub chain_id: String,
    pub name: String,
}
