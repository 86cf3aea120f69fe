//! Excavation demo
//!
//! Runs the orchestrator against a workshop service until Ctrl+C:
//! - Reuses a user id saved by an earlier run, or registers and saves a new one
//! - Prints every stored bucket with the running throughput
//! - Prints the final totals on shutdown
//!
//! Configuration comes from the environment (a `.env` file is honoured):
//!
//! ```text
//! WORKSHOP_URL=http://localhost:8080
//! WORKSHOP_USER_NAME=digger
//! WORKSHOP_USER_ID_FILE=.workshop-user-id
//! WORKSHOP_TIMEOUT_MS=1000
//! WORKSHOP_CONCURRENCY=30
//! RUST_LOG=resilint=info
//! ```
//!
//! Run with `cargo run --example excavate`.

use resilint::{Client, ClientConfig, Event, Orchestrator, OrchestratorConfig, run_until_signal};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("resilint=info")),
        )
        .init();

    let id_file = PathBuf::from(env_or("WORKSHOP_USER_ID_FILE", ".workshop-user-id"));

    let mut config = ClientConfig::new(
        env_or("WORKSHOP_URL", "http://localhost:8080"),
        env_or("WORKSHOP_USER_NAME", "digger"),
    );
    config.timeout = Duration::from_millis(env_or("WORKSHOP_TIMEOUT_MS", "1000").parse()?);
    // A missing file just means this is the first run
    config.user_id = std::fs::read_to_string(&id_file)
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let hook_file = id_file.clone();
    let client = Client::with_registration_hook(config, move |user_id| {
        match std::fs::write(&hook_file, user_id.as_str()) {
            Ok(()) => println!("✓ Registered as {user_id}, saved to {}", hook_file.display()),
            Err(e) => eprintln!("✗ Registered as {user_id}, but could not save it: {e}"),
        }
    })
    .await?;

    let orchestrator = Orchestrator::new(
        client,
        OrchestratorConfig {
            concurrency: env_or("WORKSHOP_CONCURRENCY", "30").parse()?,
            ..Default::default()
        },
    )?;

    let mut events = orchestrator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Stored {
                    bucket_id,
                    units,
                    total_stored,
                    elapsed_secs,
                    instant_rate,
                    cumulative_rate,
                } => {
                    println!(
                        "✓ Stored {bucket_id} ({units} units): total {total_stored} in {elapsed_secs:.1}s, \
                         {instant_rate:.2} units/s now, {cumulative_rate:.2} units/s overall"
                    );
                }
                Event::StoreAbandoned {
                    bucket_id,
                    units,
                    error,
                } => {
                    eprintln!("✗ Gave up on {bucket_id} ({units} units): {error}");
                }
                Event::Stopped { stats } => {
                    println!(
                        "Stopped after {:.1}s: {} excavations ({} failed), {} gold / {} dirt, \
                         {} units stored",
                        stats.elapsed_seconds(),
                        stats.excavations_succeeded + stats.excavations_failed,
                        stats.excavations_failed,
                        stats.gold_buckets,
                        stats.dirt_buckets,
                        stats.total_stored,
                    );
                }
                _ => {}
            }
        }
    });

    println!("Excavating, press Ctrl+C to stop");
    let stats = run_until_signal(&orchestrator).await?;
    println!(
        "Final: {} units at {:.2} units/s",
        stats.total_stored,
        stats.cumulative_rate()
    );

    Ok(())
}
