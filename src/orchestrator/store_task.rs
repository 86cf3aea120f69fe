//! Store calls with at-least-once retry.

use super::Orchestrator;
use crate::error::Error;
use crate::retry::retry_with_backoff;
use crate::types::{BucketId, Event};

impl Orchestrator {
    /// Store a bucket on a tracked task, independent of the excavate loop
    pub(crate) fn spawn_store(&self, bucket_id: BucketId, units: u64) {
        let orchestrator = self.clone();
        self.store_tasks.spawn(async move {
            orchestrator.store_until_done(bucket_id, units).await;
        });
    }

    /// Retry the identical store until it is accepted or given up on
    ///
    /// Gives up on protocol violations, when the configured attempt
    /// limit is reached, and once a stop has been requested.
    pub(crate) async fn store_until_done(&self, bucket_id: BucketId, units: u64) {
        let result = retry_with_backoff(
            &self.config.store_retry,
            &self.cancel,
            || self.client.store(&bucket_id, units),
            |error: &Error, attempt, will_retry| {
                self.stats.record_store_failure();
                tracing::warn!(
                    bucket_id = %bucket_id,
                    units,
                    attempt,
                    will_retry,
                    error = %error,
                    "Store failed"
                );
                self.emit(Event::StoreFailed {
                    bucket_id: bucket_id.clone(),
                    units,
                    error: error.to_string(),
                    code: error.error_code().to_string(),
                    attempt,
                    will_retry,
                });
            },
        )
        .await;

        match result {
            Ok(_) => {
                let rates = self.stats.record_store(units);
                tracing::info!(
                    bucket_id = %bucket_id,
                    units,
                    total_stored = rates.total_stored,
                    seconds = rates.elapsed.as_secs_f64(),
                    gold_per_sec = rates.cumulative_rate,
                    "Store success"
                );
                self.emit(Event::Stored {
                    bucket_id,
                    units,
                    total_stored: rates.total_stored,
                    elapsed_secs: rates.elapsed.as_secs_f64(),
                    instant_rate: rates.instant_rate,
                    cumulative_rate: rates.cumulative_rate,
                });
            }
            Err(error) => {
                self.stats.record_store_abandoned();
                tracing::error!(
                    bucket_id = %bucket_id,
                    units,
                    error = %error,
                    "Giving up on bucket"
                );
                self.emit(Event::StoreAbandoned {
                    bucket_id,
                    units,
                    error: error.to_string(),
                });
            }
        }
    }
}
