//! Sustained excavate/store pipeline.
//!
//! The `Orchestrator` keeps `concurrency` excavate calls in flight and stores every
//! bucket worth at least one unit. Its methods are split by concern:
//! - [`workers`] - The persistent excavate loops
//! - [`store_task`] - Fire-and-forget store calls with retry
//! - [`lifecycle`] - Start, stop and graceful drain

mod lifecycle;
mod stats;
mod store_task;
mod workers;


use crate::client::Client;
use crate::config::OrchestratorConfig;
use crate::error::Result;
use crate::types::{AccumulatedStats, Event};
use stats::StatsRecorder;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Excavate/store driver (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Orchestrator {
    /// Client used by every worker
    pub(crate) client: Client,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<OrchestratorConfig>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Shared counters
    pub(crate) stats: Arc<StatsRecorder>,
    /// Stop signal: no new excavations, no further store retries
    pub(crate) cancel: CancellationToken,
    /// The persistent excavate loops
    pub(crate) workers: Arc<Mutex<JoinSet<()>>>,
    /// In-flight store tasks
    pub(crate) store_tasks: TaskTracker,
    /// Set once `start` has run
    pub(crate) started: Arc<AtomicBool>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("client", &self.client)
            .field("concurrency", &self.config.concurrency)
            .field("stopping", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Create an orchestrator; nothing runs until [`Orchestrator::start`]
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) for an invalid configuration.
    pub fn new(client: Client, config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = broadcast::channel(config.event_capacity);

        Ok(Self {
            client,
            config: Arc::new(config),
            event_tx,
            stats: Arc::new(StatsRecorder::default()),
            cancel: CancellationToken::new(),
            workers: Arc::new(Mutex::new(JoinSet::new())),
            store_tasks: TaskTracker::new(),
            started: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Subscribe to orchestrator events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current counters
    pub fn stats(&self) -> AccumulatedStats {
        self.stats.snapshot()
    }

    /// The client this orchestrator drives
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Whether a stop has been requested
    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) fn emit(&self, event: Event) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
