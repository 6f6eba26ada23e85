//! Fulfillment Waiter.
//!
//! Polls a [`RandomnessSource`] until the oracle has published randomness for
//! a seed. "Not yet fulfilled" is the only condition that is retried; every
//! error is returned on the tick it occurs.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::cancel::CancelSignal;
use crate::config::WaitOptions;
use crate::error::{Result, VrfError};
use crate::reader::RandomnessSource;
use crate::types::{AccountAddress, Randomness, Seed};

pub struct FulfillmentWaiter<S: ?Sized> {
    source: Arc<S>,
    options: WaitOptions,
}

impl<S: RandomnessSource + ?Sized> FulfillmentWaiter<S> {
    pub fn new(source: Arc<S>, options: WaitOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> WaitOptions {
        self.options
    }

    /// Same source, different poll interval or timeout.
    pub fn with_options(&self, options: WaitOptions) -> Self {
        Self {
            source: Arc::clone(&self.source),
            options,
        }
    }

    /// Wait until `seed` requested by `owner` is fulfilled.
    ///
    /// Returns [`VrfError::Cancelled`] as soon as `cancel` fires, whether the
    /// loop is sleeping or a read is in flight, and [`VrfError::Timeout`]
    /// when the configured overall timeout elapses first.
    #[instrument(skip_all, fields(%owner, %seed))]
    pub async fn await_fulfillment(
        &self,
        owner: AccountAddress,
        seed: &Seed,
        cancel: &CancelSignal,
    ) -> Result<Randomness> {
        let polling = self.poll(owner, seed, cancel);
        match self.options.timeout {
            Some(limit) => tokio::time::timeout(limit, polling)
                .await
                .map_err(|_| VrfError::Timeout(limit))?,
            None => polling.await,
        }
    }

    async fn poll(&self, owner: AccountAddress, seed: &Seed, cancel: &CancelSignal) -> Result<Randomness> {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(VrfError::Cancelled);
            }
            attempt += 1;

            let read = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VrfError::Cancelled),
                read = self.source.read_randomness(owner, seed) => read?,
            };

            if let Some(randomness) = read {
                info!(attempt, randomness = %randomness, "Randomness fulfilled");
                return Ok(randomness);
            }
            debug!(attempt, "Randomness not fulfilled yet");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(VrfError::Cancelled),
                _ = tokio::time::sleep(self.options.poll_interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_millis(1000);

    /// Replays scripted reads, then reports "not yet fulfilled" forever.
    #[derive(Default)]
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Option<Randomness>>>>,
        reads: Mutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn with(script: Vec<Result<Option<Randomness>>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                reads: Mutex::new(Vec::new()),
            })
        }

        fn reads(&self) -> Vec<Instant> {
            self.reads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RandomnessSource for ScriptedSource {
        async fn read_randomness(&self, _: AccountAddress, _: &Seed) -> Result<Option<Randomness>> {
            self.reads.lock().unwrap().push(Instant::now());
            self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    /// Never answers.
    struct HangingSource;

    #[async_trait]
    impl RandomnessSource for HangingSource {
        async fn read_randomness(&self, _: AccountAddress, _: &Seed) -> Result<Option<Randomness>> {
            std::future::pending().await
        }
    }

    fn options(timeout: Option<Duration>) -> WaitOptions {
        WaitOptions {
            poll_interval: INTERVAL,
            timeout,
        }
    }

    fn owner() -> AccountAddress {
        AccountAddress::from_hex_literal("0xa11ce").unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fulfilled_on_third_poll() {
        let randomness = Randomness::new(vec![7; 64]);
        let source = ScriptedSource::with(vec![Ok(None), Ok(None), Ok(Some(randomness.clone()))]);
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));

        let result = waiter
            .await_fulfillment(owner(), &Seed::new([1; 32]), &CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(result, randomness);

        let reads = source.reads();
        assert_eq!(reads.len(), 3);
        for pair in reads.windows(2) {
            assert_eq!(pair[1] - pair[0], INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn record_not_found_fails_fast() {
        let source = ScriptedSource::with(vec![Err(VrfError::RecordNotFound("resource_not_found".into()))]);
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));

        let started = Instant::now();
        let err = waiter
            .await_fulfillment(owner(), &Seed::new([1; 32]), &CancelSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, VrfError::RecordNotFound(_)));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(source.reads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_errors_are_not_retried() {
        let source = ScriptedSource::with(vec![
            Ok(None),
            Err(VrfError::NetworkUnavailable("connection reset".into())),
        ]);
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));

        let err = waiter
            .await_fulfillment(owner(), &Seed::new([1; 32]), &CancelSignal::new())
            .await
            .unwrap_err();
        assert!(matches!(err, VrfError::NetworkUnavailable(_)));
        assert_eq!(source.reads().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_mid_wait_stops_polling() {
        let source = ScriptedSource::with(Vec::new());
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));
        let cancel = CancelSignal::new();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                waiter
                    .await_fulfillment(owner(), &Seed::new([1; 32]), &cancel)
                    .await
            }
        });

        tokio::time::sleep(INTERVAL + INTERVAL / 2).await;
        let cancelled_at = Instant::now();
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, VrfError::Cancelled));
        assert!(cancelled_at.elapsed() < INTERVAL);

        let reads = source.reads().len();
        assert_eq!(reads, 2);
        tokio::time::sleep(INTERVAL * 5).await;
        assert_eq!(source.reads().len(), reads);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_in_flight_read() {
        let waiter = FulfillmentWaiter::new(Arc::new(HangingSource), options(None));
        let cancel = CancelSignal::new();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                waiter
                    .await_fulfillment(owner(), &Seed::new([1; 32]), &cancel)
                    .await
            }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        assert!(matches!(task.await.unwrap(), Err(VrfError::Cancelled)));
    }

    #[tokio::test]
    async fn already_cancelled_never_reads() {
        let source = ScriptedSource::with(Vec::new());
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));
        let cancel = CancelSignal::new();
        cancel.cancel();

        let err = waiter
            .await_fulfillment(owner(), &Seed::new([1; 32]), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, VrfError::Cancelled));
        assert!(source.reads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn overall_timeout() {
        let limit = Duration::from_millis(3500);
        let source = ScriptedSource::with(Vec::new());
        let waiter = FulfillmentWaiter::new(source.clone(), options(Some(limit)));

        let started = Instant::now();
        let err = waiter
            .await_fulfillment(owner(), &Seed::new([1; 32]), &CancelSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, VrfError::Timeout(d) if d == limit));
        assert_eq!(started.elapsed(), limit);
        assert_eq!(source.reads().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn with_options_shares_the_source() {
        let source = ScriptedSource::with(vec![Ok(None), Ok(Some(Randomness::new(vec![1])))]);
        let waiter = FulfillmentWaiter::new(source.clone(), options(None));
        let fast = waiter.with_options(WaitOptions {
            poll_interval: Duration::from_millis(100),
            timeout: None,
        });

        let started = Instant::now();
        fast.await_fulfillment(owner(), &Seed::new([1; 32]), &CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(100));
        assert_eq!(waiter.options().poll_interval, INTERVAL);
    }
}
