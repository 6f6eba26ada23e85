//! Payload Builder.
//!
//! Maps a logical oracle [`Operation`] onto the entry-function payload for the
//! configured deployment. Building is pure: no network, no signing. The only
//! failure mode is malformed input, reported as
//! [`VrfError::InvalidArgument`](crate::VrfError::InvalidArgument).

use serde_json::{Value, json};

use crate::config::OracleConfig;
use crate::error::{Result, VrfError};
use crate::types::{AccountAddress, Seed, TransactionPayload};

/// Module function invoked by the oracle once a callback request is fulfilled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    pub module_address: AccountAddress,
    pub module_name: String,
    pub function: String,
    /// Type arguments forwarded to the callback.
    pub type_arguments: Vec<String>,
    /// Amount reserved from the requester's treasury balance for the callback.
    pub fee_amount: u64,
}

/// Logical operation against the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Request {
        seed: Seed,
    },
    RequestWithCallback {
        seed: Seed,
        callback: Callback,
    },
    Deposit {
        coin_type: String,
        amount: u64,
    },
    DepositForUser {
        coin_type: String,
        recipient: AccountAddress,
        amount: u64,
    },
    Withdraw {
        coin_type: String,
        amount: u64,
    },
}

impl Operation {
    pub fn function(&self) -> &'static str {
        match self {
            Operation::Request { .. } => "request",
            Operation::RequestWithCallback { .. } => "request_with_callback",
            Operation::Deposit { .. } => "deposit",
            Operation::DepositForUser { .. } => "deposit_for_user",
            Operation::Withdraw { .. } => "withdraw",
        }
    }

    fn needs_treasury(&self) -> bool {
        !matches!(self, Operation::Request { .. })
    }
}

/// Builds payloads for one oracle deployment.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    config: OracleConfig,
}

impl PayloadBuilder {
    pub fn new(config: OracleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    /// Build the payload for any operation.
    pub fn build(&self, operation: &Operation) -> Result<TransactionPayload> {
        if operation.needs_treasury() && !self.config.version.supports_treasury() {
            return Err(VrfError::InvalidArgument(format!(
                "`{}` is not available on oracle {:?}",
                operation.function(),
                self.config.version
            )));
        }

        let (type_arguments, arguments) = match operation {
            Operation::Request { seed } => (vec![], vec![json!(seed.to_hex())]),
            Operation::RequestWithCallback { seed, callback } => {
                validate_identifier("callback module", &callback.module_name)?;
                validate_identifier("callback function", &callback.function)?;
                for tag in &callback.type_arguments {
                    validate_type_tag(tag)?;
                }
                (
                    callback.type_arguments.clone(),
                    vec![
                        json!(seed.to_hex()),
                        json!(callback.module_address.to_hex_literal()),
                        json!(callback.module_name),
                        json!(callback.function),
                        u64_argument(callback.fee_amount),
                    ],
                )
            }
            Operation::Deposit { coin_type, amount }
            | Operation::Withdraw { coin_type, amount } => {
                validate_coin_type(coin_type)?;
                validate_amount(*amount)?;
                (vec![coin_type.clone()], vec![u64_argument(*amount)])
            }
            Operation::DepositForUser {
                coin_type,
                recipient,
                amount,
            } => {
                validate_coin_type(coin_type)?;
                validate_amount(*amount)?;
                (
                    vec![coin_type.clone()],
                    vec![json!(recipient.to_hex_literal()), u64_argument(*amount)],
                )
            }
        };

        Ok(TransactionPayload::entry_function(
            self.config.function_id(operation.function()),
            type_arguments,
            arguments,
        ))
    }

    /// Request randomness for a 32-byte seed.
    pub fn build_request_payload(&self, seed: &[u8]) -> Result<TransactionPayload> {
        let seed = Seed::try_from(seed)?;
        self.build(&Operation::Request { seed })
    }

    pub fn build_deposit_payload(&self, coin_type: &str, amount: u64) -> Result<TransactionPayload> {
        self.build(&Operation::Deposit {
            coin_type: coin_type.to_string(),
            amount,
        })
    }

    pub fn build_deposit_for_user_payload(
        &self,
        coin_type: &str,
        recipient: AccountAddress,
        amount: u64,
    ) -> Result<TransactionPayload> {
        self.build(&Operation::DepositForUser {
            coin_type: coin_type.to_string(),
            recipient,
            amount,
        })
    }

    pub fn build_withdraw_payload(&self, coin_type: &str, amount: u64) -> Result<TransactionPayload> {
        self.build(&Operation::Withdraw {
            coin_type: coin_type.to_string(),
            amount,
        })
    }

    /// Request randomness and have the oracle call back into
    /// `callback_module_address::callback_module_name::callback_function`.
    pub fn build_request_with_callback_payload(
        &self,
        seed: &[u8],
        callback_module_address: AccountAddress,
        callback_module_name: &str,
        callback_function: &str,
        type_arguments: Vec<String>,
        fee_amount: u64,
    ) -> Result<TransactionPayload> {
        let seed = Seed::try_from(seed)?;
        self.build(&Operation::RequestWithCallback {
            seed,
            callback: Callback {
                module_address: callback_module_address,
                module_name: callback_module_name.to_string(),
                function: callback_function.to_string(),
                type_arguments,
                fee_amount,
            },
        })
    }
}

/// The node's JSON API takes `u64` arguments as decimal strings.
fn u64_argument(value: u64) -> Value {
    Value::String(value.to_string())
}

fn validate_amount(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(VrfError::InvalidArgument("amount must be positive".into()));
    }
    Ok(())
}

fn validate_identifier(what: &str, name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(VrfError::InvalidArgument(format!(
            "{what} is not a valid identifier: {name:?}"
        )));
    }
    Ok(())
}

/// A coin type is always a struct tag, never a primitive or a vector.
fn validate_coin_type(tag: &str) -> Result<()> {
    validate_type_tag(tag)?;
    if tag.starts_with("vector<") || !tag.contains("::") {
        return Err(VrfError::InvalidArgument(format!(
            "coin type must be a struct tag: {tag:?}"
        )));
    }
    Ok(())
}

/// Checks the `address::module::Name` shape, recursing into generic
/// parameters. Primitive tags (`u64`, `address`, `vector<u8>`...) are accepted
/// as type arguments as well. The tag is sent verbatim, so surrounding
/// whitespace is rejected; only generic parameters may be padded.
fn validate_type_tag(tag: &str) -> Result<()> {
    let invalid = || VrfError::InvalidArgument(format!("invalid type tag: {tag:?}"));
    if tag.trim() != tag {
        return Err(invalid());
    }

    const PRIMITIVES: [&str; 9] = [
        "bool", "u8", "u16", "u32", "u64", "u128", "u256", "address", "signer",
    ];
    if PRIMITIVES.contains(&tag) {
        return Ok(());
    }
    if let Some(inner) = tag.strip_prefix("vector<").and_then(|t| t.strip_suffix('>')) {
        return validate_type_tag(inner).map_err(|_| invalid());
    }

    let (path, generics) = match tag.find('<') {
        Some(open) => {
            let inner = tag[open + 1..].strip_suffix('>').ok_or_else(invalid)?;
            (&tag[..open], Some(inner))
        }
        None => (tag, None),
    };

    let parts: Vec<&str> = path.split("::").collect();
    let [address, module, name] = parts.as_slice() else {
        return Err(invalid());
    };
    AccountAddress::from_hex_literal(address).map_err(|_| invalid())?;
    validate_identifier("module", module).map_err(|_| invalid())?;
    validate_identifier("struct", name).map_err(|_| invalid())?;

    if let Some(inner) = generics {
        for param in split_generics(inner) {
            validate_type_tag(param.trim()).map_err(|_| invalid())?;
        }
    }
    Ok(())
}

/// Split top-level comma separated generic parameters.
fn split_generics(inner: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                params.push(&inner[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&inner[start..]);
    params
}
