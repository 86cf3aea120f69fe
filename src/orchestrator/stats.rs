//! Throughput counters.

use crate::types::AccumulatedStats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

/// Rates reported with each successful store
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StoreRates {
    pub(crate) total_stored: u64,
    pub(crate) elapsed: Duration,
    /// Units per second since the previous successful store (or since start)
    pub(crate) instant_rate: f64,
    /// Units per second since start
    pub(crate) cumulative_rate: f64,
}

/// Lock-free counters shared by every worker and store task
#[derive(Default)]
pub(crate) struct StatsRecorder {
    started_at: OnceLock<Instant>,
    last_store_at: Mutex<Option<Instant>>,
    total_stored: AtomicU64,
    excavations_succeeded: AtomicU64,
    excavations_failed: AtomicU64,
    gold_buckets: AtomicU64,
    dirt_buckets: AtomicU64,
    stores_succeeded: AtomicU64,
    store_failures: AtomicU64,
    stores_abandoned: AtomicU64,
}

impl StatsRecorder {
    /// Start the clock (later calls keep the first start time)
    pub(crate) fn mark_started(&self) {
        let _ = self.started_at.set(Instant::now());
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at
            .get()
            .map(Instant::elapsed)
            .unwrap_or_default()
    }

    pub(crate) fn record_excavation(&self, gold: bool) {
        self.excavations_succeeded.fetch_add(1, Ordering::Relaxed);
        if gold {
            self.gold_buckets.fetch_add(1, Ordering::Relaxed);
        } else {
            self.dirt_buckets.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_excavation_failure(&self) {
        self.excavations_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_failure(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store_abandoned(&self) {
        self.stores_abandoned.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_store(&self, units: u64) -> StoreRates {
        let now = Instant::now();
        let total_stored = self.total_stored.fetch_add(units, Ordering::Relaxed) + units;
        self.stores_succeeded.fetch_add(1, Ordering::Relaxed);

        let started_at = self.started_at.get().copied().unwrap_or(now);
        let since_last = {
            let mut last = self
                .last_store_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let previous = last.replace(now).unwrap_or(started_at);
            now.saturating_duration_since(previous)
        };

        let elapsed = now.saturating_duration_since(started_at);
        StoreRates {
            total_stored,
            elapsed,
            instant_rate: rate(units, since_last),
            cumulative_rate: rate(total_stored, elapsed),
        }
    }

    pub(crate) fn snapshot(&self) -> AccumulatedStats {
        AccumulatedStats {
            total_stored: self.total_stored.load(Ordering::Relaxed),
            elapsed: self.elapsed(),
            excavations_succeeded: self.excavations_succeeded.load(Ordering::Relaxed),
            excavations_failed: self.excavations_failed.load(Ordering::Relaxed),
            gold_buckets: self.gold_buckets.load(Ordering::Relaxed),
            dirt_buckets: self.dirt_buckets.load(Ordering::Relaxed),
            stores_succeeded: self.stores_succeeded.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            stores_abandoned: self.stores_abandoned.load(Ordering::Relaxed),
        }
    }
}

fn rate(units: u64, over: Duration) -> f64 {
    let secs = over.as_secs_f64();
    if secs > 0.0 { units as f64 / secs } else { 0.0 }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_stored_accumulates() {
        let stats = StatsRecorder::default();
        stats.mark_started();

        assert_eq!(stats.record_store(4).total_stored, 4);
        assert_eq!(stats.record_store(3).total_stored, 7);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.total_stored, 7);
        assert_eq!(snapshot.stores_succeeded, 2);
    }

    #[test]
    fn counts_gold_and_dirt_separately() {
        let stats = StatsRecorder::default();
        stats.record_excavation(true);
        stats.record_excavation(false);
        stats.record_excavation(false);
        stats.record_excavation_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.excavations_succeeded, 3);
        assert_eq!(snapshot.gold_buckets, 1);
        assert_eq!(snapshot.dirt_buckets, 2);
        assert_eq!(snapshot.excavations_failed, 1);
    }

    #[test]
    fn rates_are_positive_once_time_passes() {
        let stats = StatsRecorder::default();
        stats.mark_started();
        std::thread::sleep(Duration::from_millis(20));

        let rates = stats.record_store(10);
        assert!(rates.instant_rate > 0.0);
        assert!(rates.cumulative_rate > 0.0);
        assert!(rates.elapsed >= Duration::from_millis(20));
    }

    #[test]
    fn elapsed_is_zero_before_start() {
        let stats = StatsRecorder::default();
        assert_eq!(stats.elapsed(), Duration::ZERO);
        assert_eq!(rate(5, Duration::ZERO), 0.0);
    }
}
