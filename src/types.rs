//! Core types and events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Server-issued user identifier
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId(id.to_string())
    }
}

/// Identifier of an excavated bucket
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketId(pub String);

impl BucketId {
    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BucketId {
    fn from(id: String) -> Self {
        BucketId(id)
    }
}

impl From<&str> for BucketId {
    fn from(id: &str) -> Self {
        BucketId(id.to_string())
    }
}

/// What an excavated bucket contains
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    /// Worth storing
    Gold,
    /// Worthless
    Dirt,
}

/// Normalized excavate response
///
/// The value of a bucket is derived from its kind, so a dirt bucket can never carry
/// value regardless of how many units it reports.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcavationResult {
    /// Bucket the server handed out
    pub bucket_id: BucketId,
    /// Gold or dirt
    pub kind: BucketKind,
    /// Units reported by the server
    pub units: u64,
}

impl ExcavationResult {
    /// Storable value: `units` for gold, 0 for dirt
    pub fn value(&self) -> u64 {
        match self.kind {
            BucketKind::Gold => self.units,
            BucketKind::Dirt => 0,
        }
    }

    /// Whether this bucket is worth a store call
    pub fn is_storable(&self) -> bool {
        self.value() >= 1
    }
}

/// Whether the server accepted a stored bucket
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOutcome {
    /// True when the server answered with the literal body `true`
    pub accepted: bool,
}

/// Counters accumulated by the orchestrator
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatedStats {
    /// Gold units successfully stored (never decreases)
    pub total_stored: u64,
    /// Time since the orchestrator started
    pub elapsed: Duration,
    /// Excavate calls that produced a bucket
    pub excavations_succeeded: u64,
    /// Excavate calls that failed
    pub excavations_failed: u64,
    /// Gold buckets found
    pub gold_buckets: u64,
    /// Dirt buckets found
    pub dirt_buckets: u64,
    /// Store calls accepted by the server
    pub stores_succeeded: u64,
    /// Failed store attempts (each retry counts)
    pub store_failures: u64,
    /// Buckets given up on
    pub stores_abandoned: u64,
}

impl AccumulatedStats {
    /// Elapsed time in fractional seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Stored units per elapsed second (0.0 before any time has passed)
    pub fn cumulative_rate(&self) -> f64 {
        let secs = self.elapsed_seconds();
        if secs > 0.0 {
            self.total_stored as f64 / secs
        } else {
            0.0
        }
    }
}

/// Event emitted while the orchestrator runs
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Excavation produced a bucket
    Excavated {
        /// The normalized result
        result: ExcavationResult,
        /// Whether a store call was issued for it
        storing: bool,
    },

    /// Excavation failed; the worker moves on to the next call
    ExcavationFailed {
        /// Error message
        error: String,
        /// Machine-readable error code
        code: String,
    },

    /// Bucket stored
    Stored {
        /// Bucket that was stored
        bucket_id: BucketId,
        /// Units stored
        units: u64,
        /// Gold stored so far
        total_stored: u64,
        /// Seconds since the orchestrator started
        elapsed_secs: f64,
        /// Units per second since the previous successful store
        instant_rate: f64,
        /// Units per second since start
        cumulative_rate: f64,
    },

    /// Store attempt failed
    StoreFailed {
        /// Bucket being stored
        bucket_id: BucketId,
        /// Units being stored
        units: u64,
        /// Error message
        error: String,
        /// Machine-readable error code
        code: String,
        /// 1-based attempt number that failed
        attempt: u32,
        /// Whether another attempt will be made
        will_retry: bool,
    },

    /// Gave up on a bucket (protocol violation, retry limit, or shutdown)
    StoreAbandoned {
        /// Bucket that was not stored
        bucket_id: BucketId,
        /// Units lost
        units: u64,
        /// Last error message
        error: String,
    },

    /// Orchestrator finished draining
    Stopped {
        /// Final counters
        stats: AccumulatedStats,
    },
}
