//! Startup and shutdown coordination.

use super::Orchestrator;
use crate::error::{Error, Result};
use crate::types::{AccumulatedStats, Event};
use std::sync::atomic::Ordering;

impl Orchestrator {
    /// Start `concurrency` excavate workers
    ///
    /// Calling `start` again while running is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] if a stop was already requested.
    pub async fn start(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::ShuttingDown);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::debug!("Orchestrator already running");
            return Ok(());
        }

        self.stats.mark_started();

        let mut workers = self.workers.lock().await;
        for worker in 0..self.config.concurrency {
            workers.spawn(self.clone().run_worker(worker));
        }

        tracing::info!(
            concurrency = self.config.concurrency,
            user_id = ?self.client.user_id(),
            "Orchestrator started"
        );
        Ok(())
    }

    /// Request a stop without waiting
    ///
    /// Workers finish their in-flight excavation and exit; store tasks finish their
    /// in-flight attempt and make no further retries. Nothing in flight is interrupted.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Stop requested, draining in-flight requests");
        }
        self.cancel.cancel();
    }

    /// Wait until every worker and store task has finished
    ///
    /// Workers only finish after [`Orchestrator::stop`], so this waits forever on a
    /// running orchestrator that nobody stops.
    pub async fn wait_drained(&self) {
        {
            let mut workers = self.workers.lock().await;
            while let Some(joined) = workers.join_next().await {
                if let Err(e) = joined
                    && e.is_panic()
                {
                    tracing::error!(error = %e, "Excavate worker panicked");
                }
            }
        }

        // Workers are gone, so no new store tasks can appear
        self.store_tasks.close();
        self.store_tasks.wait().await;
    }

    /// Gracefully shut down: stop, drain within `drain_timeout`, report final stats
    ///
    /// Workers still running when the drain timeout elapses are aborted.
    pub async fn shutdown(&self) -> AccumulatedStats {
        tracing::info!("Initiating graceful shutdown");
        self.stop();

        match tokio::time::timeout(self.config.drain_timeout, self.wait_drained()).await {
            Ok(()) => {
                tracing::info!("All in-flight requests drained");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.drain_timeout.as_millis(),
                    "Timeout waiting for in-flight requests, aborting workers"
                );
                self.workers.lock().await.abort_all();
            }
        }

        let stats = self.stats.snapshot();
        tracing::info!(
            total_stored = stats.total_stored,
            seconds = stats.elapsed_seconds(),
            gold_per_sec = stats.cumulative_rate(),
            "Shutdown complete"
        );
        self.emit(Event::Stopped {
            stats: stats.clone(),
        });
        stats
    }
}
