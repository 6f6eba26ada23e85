//! Run statistics for the demo.
//!
//! All counters are backed by atomics so concurrent waiters can share one
//! instance through an `Arc`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct Stats {
    /// Requests committed on chain.
    pub requests_submitted: AtomicU64,
    /// Requests whose randomness was observed.
    pub requests_fulfilled: AtomicU64,
    /// Requests that failed to submit or to resolve.
    pub requests_failed: AtomicU64,
    /// Waits abandoned through cancellation.
    pub requests_cancelled: AtomicU64,
    /// Sum of submit-to-fulfillment latencies in milliseconds.
    pub fulfillment_latency_sum_ms: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_submission(&self) {
        self.requests_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fulfillment(&self, latency: Duration) {
        self.requests_fulfilled.fetch_add(1, Ordering::Relaxed);
        self.fulfillment_latency_sum_ms
            .fetch_add(latency.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cancellation(&self) {
        self.requests_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    /// Average fulfillment latency in milliseconds, or 0 if none.
    pub fn avg_latency_ms(&self) -> u64 {
        let count = self.requests_fulfilled.load(Ordering::Relaxed);
        if count == 0 {
            return 0;
        }
        self.fulfillment_latency_sum_ms.load(Ordering::Relaxed) / count
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests_submitted": self.requests_submitted.load(Ordering::Relaxed),
            "requests_fulfilled": self.requests_fulfilled.load(Ordering::Relaxed),
            "requests_failed": self.requests_failed.load(Ordering::Relaxed),
            "requests_cancelled": self.requests_cancelled.load(Ordering::Relaxed),
            "avg_fulfillment_latency_ms": self.avg_latency_ms(),
        })
    }
}
