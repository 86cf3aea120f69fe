//! Persistent excavate loops.

use super::Orchestrator;
use crate::error::Error;
use crate::types::{BucketKind, Event, ExcavationResult};

impl Orchestrator {
    /// One excavate loop: issue a call, handle its outcome, repeat until stopped
    ///
    /// Re-issuing is the loop itself, so a failed excavation is followed by the next
    /// call exactly like a successful one. A stop request is only checked between
    /// calls, which lets the in-flight call finish.
    pub(crate) async fn run_worker(self, worker: usize) {
        tracing::debug!(worker, "Excavate worker started");

        while !self.cancel.is_cancelled() {
            match self.client.excavate().await {
                Ok(result) => self.handle_excavation(worker, result),
                Err(e) => self.handle_excavation_failure(worker, e),
            }
            // A transport that answers without suspending must not monopolize the thread
            tokio::task::yield_now().await;
        }

        tracing::debug!(worker, "Excavate worker stopped");
    }

    fn handle_excavation(&self, worker: usize, result: ExcavationResult) {
        self.stats.record_excavation(result.kind == BucketKind::Gold);

        let storing = result.is_storable();
        if storing {
            tracing::info!(
                worker,
                bucket_id = %result.bucket_id,
                value = result.value(),
                "Excavate success, storing"
            );
            self.spawn_store(result.bucket_id.clone(), result.value());
        } else {
            tracing::debug!(
                worker,
                bucket_id = %result.bucket_id,
                kind = ?result.kind,
                units = result.units,
                "Excavate success, nothing to store"
            );
        }

        self.emit(Event::Excavated { result, storing });
    }

    fn handle_excavation_failure(&self, worker: usize, error: Error) {
        self.stats.record_excavation_failure();
        tracing::warn!(worker, error = %error, kind = ?error.kind(), "Excavate failed");
        self.emit(Event::ExcavationFailed {
            code: error.error_code().to_string(),
            error: error.to_string(),
        });
    }
}
