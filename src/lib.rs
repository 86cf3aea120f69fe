//! # resilint
//!
//! Resilient client for the gold excavation workshop service.
//!
//! The service hands out buckets of gold or dirt through a slow, flaky HTTP API.
//! This crate wraps the three endpoints in a typed [`Client`] and drives them with an
//! [`Orchestrator`] that keeps a fixed number of excavations in flight and stores
//! every bucket worth at least one unit until the service accepts it.
//!
//! ## Quick Start
//!
//! ```no_run
//! use resilint::{Client, ClientConfig, Orchestrator, OrchestratorConfig, run_until_signal};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("http://localhost:8080", "digger");
//!     let client = Client::new(config).await?;
//!
//!     let orchestrator = Orchestrator::new(client, OrchestratorConfig::default())?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let stats = run_until_signal(&orchestrator).await?;
//!     println!("stored {} units", stats.total_stored);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Typed client for the register, excavate and store endpoints
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Excavate/store pipeline
pub mod orchestrator;
/// Wire format of the three endpoints
pub mod protocol;
/// Retry logic with exponential backoff
pub mod retry;
/// HTTP transport seam
pub mod transport;
/// Core types and events
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod test_helpers;

// Re-export commonly used types
pub use client::{Client, ExcavateHandler, OnRegistered, StoreHandler};
pub use config::{ClientConfig, OrchestratorConfig, RetryConfig};
pub use error::{Error, ErrorKind, Result};
pub use orchestrator::Orchestrator;
pub use protocol::Endpoint;
pub use transport::{HttpTransport, Transport, TransportResponse};
pub use types::{
    AccumulatedStats, BucketId, BucketKind, Event, ExcavationResult, StoreOutcome, UserId,
};

/// Start the orchestrator and run it until a termination signal arrives.
///
/// Waits for the signal, then calls the orchestrator's `shutdown()` method and returns
/// the final stats.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Errors
///
/// Returns [`Error::ShuttingDown`] if the orchestrator was already stopped.
pub async fn run_until_signal(orchestrator: &Orchestrator) -> Result<AccumulatedStats> {
    orchestrator.start().await?;
    wait_for_signal().await;
    Ok(orchestrator.shutdown().await)
}

/// Resolve on SIGTERM or SIGINT
///
/// A signal that cannot be registered (some sandboxes refuse) is skipped; with
/// neither available this falls back to `ctrl_c`.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    async fn next(stream: Option<Signal>) {
        match stream {
            Some(mut stream) => {
                stream.recv().await;
            }
            None => std::future::pending().await,
        }
    }

    let register = |kind: SignalKind, name: &'static str| {
        signal(kind)
            .inspect_err(|e| tracing::warn!(signal = name, error = %e, "Signal handler unavailable"))
            .ok()
    };
    let terminate = register(SignalKind::terminate(), "SIGTERM");
    let interrupt = register(SignalKind::interrupt(), "SIGINT");

    if terminate.is_none() && interrupt.is_none() {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "No signal source available, stopping now");
        }
        return;
    }

    tokio::select! {
        _ = next(terminate) => tracing::info!(signal = "SIGTERM", "Stopping on signal"),
        _ = next(interrupt) => tracing::info!(signal = "SIGINT", "Stopping on signal"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "No signal source available, stopping now");
        return;
    }
    tracing::info!(signal = "ctrl-c", "Stopping on signal");
}
