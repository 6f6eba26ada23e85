//! Transaction Dispatcher.
//!
//! Normalizes the signer variants into one submission call, then blocks
//! until the chain reports the transaction as included:
//!
//! 1. **Local**: the sequence number is fetched, the unsigned transaction is
//!    encoded by the node, signed in process and submitted.
//! 2. **Extension wallets**: a single vendor call signs and submits; the
//!    vendor response is unwrapped into the same [`SubmissionResult`].
//! 3. **Inclusion**: the hash is polled until committed. A committed but
//!    failed transaction surfaces as `TransactionFailed`. Any other failure
//!    after submission surfaces as `Unconfirmed`, carrying the hash and seed.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, instrument, warn};

use crate::account::LocalAccount;
use crate::config::TransactionOptions;
use crate::error::{Result, VrfError};
use crate::rpc::{LedgerRpc, SubmissionRequest};
use crate::types::{PendingTransaction, Seed, TransactionPayload};
use crate::wallet::{Signer, WalletError};

/// Outcome of a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Seed of a request payload, as the chain received it.
    pub seed: Option<Seed>,
    pub hash: String,
}

/// A payload paired with the signer that will submit it.
#[derive(Debug, Clone, Copy)]
pub struct PendingSubmission<'a> {
    pub payload: &'a TransactionPayload,
    pub signer: Signer<'a>,
}

/// Submits payloads and waits for their inclusion.
pub struct Dispatcher<R> {
    rpc: Arc<R>,
    options: TransactionOptions,
}

impl<R: LedgerRpc> Dispatcher<R> {
    pub fn new(rpc: Arc<R>, options: TransactionOptions) -> Self {
        Self { rpc, options }
    }

    pub fn options(&self) -> &TransactionOptions {
        &self.options
    }

    /// Sign, submit and wait for `payload` to be included.
    pub async fn submit(
        &self,
        payload: &TransactionPayload,
        signer: Signer<'_>,
    ) -> Result<SubmissionResult> {
        self.dispatch(PendingSubmission { payload, signer }).await
    }

    #[instrument(skip_all, fields(function = %pending.payload.function, signer = pending.signer.kind()))]
    async fn dispatch(&self, pending: PendingSubmission<'_>) -> Result<SubmissionResult> {
        let (hash, echoed) = match pending.signer {
            Signer::Local(account) => {
                let txn = self.submit_local(account, pending.payload).await?;
                (txn.hash, txn.payload)
            }
            Signer::Petra(wallet) => {
                let txn = wallet
                    .sign_and_submit_transaction(pending.payload)
                    .await
                    .map_err(rejected)?;
                (txn.hash, txn.payload)
            }
            Signer::Pontem(wallet) => {
                let response = wallet.sign_and_submit(pending.payload).await.map_err(rejected)?;
                (response.result.hash, Some(response.payload))
            }
        };

        let seed = echoed_seed(pending.payload, echoed.as_ref());
        info!(hash = %hash, seed = ?seed, "Transaction submitted");

        self.rpc
            .wait_for_transaction(&hash, self.options.confirmation_timeout)
            .await
            .map_err(|err| match err {
                VrfError::TransactionFailed { .. } => err,
                source => {
                    warn!(hash = %hash, error = %source, "Transaction not confirmed");
                    VrfError::Unconfirmed {
                        hash: hash.clone(),
                        seed,
                        source: Box::new(source),
                    }
                }
            })?;
        info!(hash = %hash, "Transaction committed");

        Ok(SubmissionResult { seed, hash })
    }

    async fn submit_local(
        &self,
        account: &LocalAccount,
        payload: &TransactionPayload,
    ) -> Result<PendingTransaction> {
        let sequence_number = self.rpc.account(account.address()).await?.sequence_number;

        let mut request = SubmissionRequest {
            sender: account.address(),
            sequence_number: sequence_number.to_string(),
            max_gas_amount: self.options.max_gas_amount.to_string(),
            gas_unit_price: self.options.gas_unit_price.to_string(),
            expiration_timestamp_secs: expiration(self.options.expiration_secs).to_string(),
            payload: payload.clone(),
            signature: None,
        };

        let message = self.rpc.encode_submission(&request).await?;
        request.signature = Some(account.sign(&message));
        self.rpc.submit_transaction(&request).await
    }
}

/// Seed the chain will key the randomness record on.
///
/// Prefers the payload echoed back by the signer over the one we built, so a
/// wallet that rewrote the arguments cannot send the waiter after the wrong
/// record.
fn echoed_seed(built: &TransactionPayload, echoed: Option<&TransactionPayload>) -> Option<Seed> {
    let expected = built.seed();
    let Some(actual) = echoed.and_then(TransactionPayload::seed) else {
        return expected;
    };
    if expected.is_some_and(|seed| seed != actual) {
        warn!(
            expected = ?expected,
            echoed = %actual,
            "Signer submitted a different seed than requested"
        );
    }
    Some(actual)
}

fn rejected(err: WalletError) -> VrfError {
    VrfError::SubmissionRejected(err.to_string())
}

fn expiration(expiration_secs: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    now + expiration_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OracleConfig, OracleVersion};
    use crate::payload::PayloadBuilder;
    use crate::rpc::tests::{committed, pending};
    use crate::rpc::{AccountInfo, LedgerInfo, TableItemRequest, TransactionInfo, ViewRequest};
    use crate::types::AccountAddress;
    use crate::wallet::tests::{MockPetra, MockPontem, pending_for};
    use async_trait::async_trait;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Ledger stub that accepts every submission and reports a fixed outcome.
    struct StubLedger {
        success: bool,
        /// Report every lookup as still pending.
        stuck: bool,
        submitted: Mutex<Vec<SubmissionRequest>>,
        encoded: Mutex<usize>,
    }

    impl StubLedger {
        fn new(success: bool) -> Arc<Self> {
            Arc::new(Self {
                success,
                stuck: false,
                submitted: Mutex::new(Vec::new()),
                encoded: Mutex::new(0),
            })
        }

        fn stuck() -> Arc<Self> {
            Arc::new(Self {
                success: true,
                stuck: true,
                submitted: Mutex::new(Vec::new()),
                encoded: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl LedgerRpc for StubLedger {
        async fn ledger_info(&self) -> Result<LedgerInfo> {
            Ok(LedgerInfo {
                chain_id: 4,
                ledger_version: "100".into(),
            })
        }
        async fn account(&self, _: AccountAddress) -> Result<AccountInfo> {
            Ok(AccountInfo {
                sequence_number: 7,
                authentication_key: String::new(),
            })
        }
        async fn resource(&self, _: AccountAddress, _: &str) -> Result<Value> {
            Err(VrfError::RecordNotFound("unused".into()))
        }
        async fn table_item(&self, _: &str, _: &TableItemRequest) -> Result<Value> {
            Err(VrfError::RecordNotFound("unused".into()))
        }
        async fn encode_submission(&self, request: &SubmissionRequest) -> Result<Vec<u8>> {
            assert!(request.signature.is_none());
            *self.encoded.lock().unwrap() += 1;
            Ok(b"signing message".to_vec())
        }
        async fn submit_transaction(&self, request: &SubmissionRequest) -> Result<PendingTransaction> {
            self.submitted.lock().unwrap().push(request.clone());
            Ok(pending_for("0xfeed", &request.sender.to_hex_literal(), &request.payload))
        }
        async fn transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionInfo>> {
            if self.stuck {
                return Ok(Some(pending(hash)));
            }
            Ok(Some(committed(hash, self.success)))
        }
        async fn view(&self, _: &ViewRequest) -> Result<Vec<Value>> {
            Ok(vec![])
        }
    }

    fn request_payload(seed: Seed) -> TransactionPayload {
        PayloadBuilder::new(OracleConfig::new(OracleVersion::V2))
            .build_request_payload(seed.as_bytes())
            .unwrap()
    }

    fn dispatcher(ledger: &Arc<StubLedger>) -> Dispatcher<StubLedger> {
        Dispatcher::new(ledger.clone(), TransactionOptions::default())
    }

    #[tokio::test]
    async fn every_signer_yields_the_same_result_shape() {
        let seed = Seed::new([1u8; 32]);
        let payload = request_payload(seed);
        let ledger = StubLedger::new(true);
        let dispatcher = dispatcher(&ledger);

        let local = LocalAccount::generate();
        let petra = MockPetra::new("0x1");
        let pontem = MockPontem {
            address: "0x1".into(),
            decline: false,
        };

        let expected = SubmissionResult {
            seed: Some(seed),
            hash: "0xfeed".into(),
        };
        for signer in [Signer::Local(&local), Signer::Petra(&petra), Signer::Pontem(&pontem)] {
            assert_eq!(dispatcher.submit(&payload, signer).await.unwrap(), expected, "{signer:?}");
        }
    }

    #[tokio::test]
    async fn local_signer_encodes_signs_and_submits() {
        let payload = request_payload(Seed::new([2u8; 32]));
        let ledger = StubLedger::new(true);
        let local = LocalAccount::generate();

        dispatcher(&ledger)
            .submit(&payload, Signer::Local(&local))
            .await
            .unwrap();

        assert_eq!(*ledger.encoded.lock().unwrap(), 1);
        let submitted = ledger.submitted.lock().unwrap();
        let request = &submitted[0];
        assert_eq!(request.sender, local.address());
        assert_eq!(request.sequence_number, "7");
        assert_eq!(request.max_gas_amount, "5000");
        assert_eq!(request.gas_unit_price, "100");
        assert_eq!(request.payload, payload);
        let signature = request.signature.as_ref().unwrap();
        assert_eq!(signature.public_key, local.public_key_hex());
    }

    #[tokio::test]
    async fn declined_wallets_are_rejections() {
        let payload = request_payload(Seed::new([3u8; 32]));
        let ledger = StubLedger::new(true);
        let dispatcher = dispatcher(&ledger);

        let mut petra = MockPetra::new("0x1");
        petra.decline = true;
        let err = dispatcher.submit(&payload, Signer::Petra(&petra)).await.unwrap_err();
        assert!(matches!(err, VrfError::SubmissionRejected(ref m) if m.contains("rejected")));

        let pontem = MockPontem {
            address: "0x1".into(),
            decline: true,
        };
        let err = dispatcher.submit(&payload, Signer::Pontem(&pontem)).await.unwrap_err();
        assert!(matches!(err, VrfError::SubmissionRejected(_)));
    }

    #[tokio::test]
    async fn failed_inclusion_is_distinct_from_rejection() {
        let payload = request_payload(Seed::new([4u8; 32]));
        let ledger = StubLedger::new(false);
        let petra = MockPetra::new("0x1");

        let err = dispatcher(&ledger)
            .submit(&payload, Signer::Petra(&petra))
            .await
            .unwrap_err();
        assert!(matches!(err, VrfError::TransactionFailed { ref hash, .. } if hash == "0xfeed"));
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_submission_keeps_hash_and_seed() {
        let seed = Seed::new([9u8; 32]);
        let payload = request_payload(seed);
        let ledger = StubLedger::stuck();
        let local = LocalAccount::generate();
        let options = TransactionOptions {
            confirmation_timeout: Duration::from_secs(2),
            ..TransactionOptions::default()
        };

        let err = Dispatcher::new(ledger.clone(), options)
            .submit(&payload, Signer::Local(&local))
            .await
            .unwrap_err();
        match err {
            VrfError::Unconfirmed {
                hash,
                seed: pending_seed,
                source,
            } => {
                assert_eq!(hash, "0xfeed");
                assert_eq!(pending_seed, Some(seed));
                assert!(matches!(*source, VrfError::Timeout(d) if d == Duration::from_secs(2)));
            }
            other => panic!("expected Unconfirmed, got {other:?}"),
        }
        assert_eq!(ledger.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn echoed_seed_wins_over_built_seed() {
        let built = request_payload(Seed::new([5u8; 32]));
        let tampered_seed = Seed::new([6u8; 32]);

        let mut petra = MockPetra::new("0x1");
        petra.echo_override = Some(request_payload(tampered_seed));

        let ledger = StubLedger::new(true);
        let result = dispatcher(&ledger)
            .submit(&built, Signer::Petra(&petra))
            .await
            .unwrap();
        assert_eq!(result.seed, Some(tampered_seed));
    }

    #[tokio::test]
    async fn non_request_payloads_carry_no_seed() {
        let payload = PayloadBuilder::new(OracleConfig::new(OracleVersion::V2))
            .build_deposit_payload("0x1::aptos_coin::AptosCoin", 100)
            .unwrap();
        let ledger = StubLedger::new(true);
        let local = LocalAccount::generate();

        let result = dispatcher(&ledger)
            .submit(&payload, Signer::Local(&local))
            .await
            .unwrap();
        assert_eq!(result.seed, None);
        assert_eq!(result.hash, "0xfeed");
    }

    #[test]
    fn seed_falls_back_to_built_payload_without_echo() {
        let seed = Seed::new([8u8; 32]);
        let built = request_payload(seed);
        assert_eq!(echoed_seed(&built, None), Some(seed));

        let mut stripped = built.clone();
        stripped.arguments = vec![json!("not hex")];
        assert_eq!(echoed_seed(&built, Some(&stripped)), Some(seed));
    }

    #[test]
    fn expiration_is_in_the_future() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let expires = expiration(10);
        assert!(expires >= now + 10 && expires <= now + 15);
    }
}
