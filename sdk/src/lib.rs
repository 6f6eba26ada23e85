//! Client SDK for the ORAO verifiable randomness oracle on Aptos.
//!
//! A request is an entry-function transaction carrying a 32-byte seed. The
//! oracle later writes randomness for that seed into a table held under the
//! requesting account. Once written, the value never changes.
//!
//! ## Request lifecycle
//!
//! 1. **Build**: [`PayloadBuilder`] turns an [`Operation`] into the
//!    entry-function payload for the configured oracle version.
//! 2. **Submit**: [`Dispatcher`] signs and submits through a [`Signer`]
//!    (local keypair or extension wallet) and waits for inclusion.
//! 3. **Read**: [`RandomnessReader`] looks the seed up in the owner's
//!    randomness table; an empty value means "not fulfilled yet".
//! 4. **Wait**: [`FulfillmentWaiter`] polls the reader until fulfilled,
//!    cancelled through a [`CancelSignal`], or timed out.
//!
//! [`OraoVrf`] wires all four together for one deployment. Each piece is also
//! usable on its own.

pub mod account;
pub mod cancel;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod payload;
pub mod reader;
pub mod rpc;
pub mod types;
pub mod waiter;
pub mod wallet;

pub use account::LocalAccount;
pub use cancel::CancelSignal;
pub use client::OraoVrf;
pub use config::{
    Network, NetworkDescriptor, OracleConfig, OracleVersion, StoreLayout, TransactionOptions,
    WaitOptions,
};
pub use dispatcher::{Dispatcher, PendingSubmission, SubmissionResult};
pub use error::{Result, VrfError};
pub use payload::{Callback, Operation, PayloadBuilder};
pub use reader::{OracleState, RandomnessReader, RandomnessSource};
pub use rpc::{LedgerRpc, RestClient};
pub use types::{AccountAddress, PendingTransaction, Randomness, Seed, TransactionPayload};
pub use waiter::FulfillmentWaiter;
pub use wallet::{PetraWallet, PontemResponse, PontemWallet, Signer};
