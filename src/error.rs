//! Error types for resilint
//!
//! Every failure the client can observe falls into one of a few kinds:
//! - transport failures (connection refused, reset, DNS) and their timeout specialization
//! - non-200 HTTP statuses
//! - protocol violations, where the server answered but the body does not match the wire schema
//!
//! Protocol violations are kept apart from transport failures because they indicate a
//! contract mismatch between client and server, not a transient condition.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for resilint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for resilint
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Connection failure, reset, DNS failure or a broken response stream
    #[error("transport error: {0}")]
    Transport(String),

    /// The configured per-request timeout elapsed before the response completed
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout {
        /// The timeout that elapsed
        after: Duration,
    },

    /// Server answered with a non-200 status
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Status line reason or response text
        message: String,
    },

    /// Response body does not match the expected schema
    #[error("protocol violation on {endpoint}: {reason}")]
    ProtocolViolation {
        /// Endpoint whose response was malformed (e.g., "/v1/excavate")
        endpoint: &'static str,
        /// What was wrong with the body
        reason: String,
    },

    /// The request was abandoned before it produced an outcome
    #[error("request cancelled before completion")]
    Cancelled,

    /// Orchestrator is draining and not accepting new work
    #[error("shutdown in progress: not issuing new requests")]
    ShuttingDown,
}

/// Coarse classification of [`Error`], used for logging and retry decisions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid configuration
    Config,
    /// Network-level failure
    Transport,
    /// Timeout, a specialization of [`ErrorKind::Transport`]
    Timeout,
    /// Non-200 response
    Status,
    /// Client/server contract mismatch
    ProtocolViolation,
    /// Request dropped before completion
    Cancelled,
    /// Shutdown in progress
    ShuttingDown,
}

impl Error {
    /// Build a protocol violation error for `endpoint`
    pub fn protocol(endpoint: &'static str, reason: impl Into<String>) -> Self {
        Error::ProtocolViolation {
            endpoint,
            reason: reason.into(),
        }
    }

    /// Build a configuration error for `key`
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config { .. } => ErrorKind::Config,
            Error::Transport(_) => ErrorKind::Transport,
            Error::Timeout { .. } => ErrorKind::Timeout,
            Error::Status { .. } => ErrorKind::Status,
            Error::ProtocolViolation { .. } => ErrorKind::ProtocolViolation,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::ShuttingDown => ErrorKind::ShuttingDown,
        }
    }

    /// Whether this is a transport-level failure (timeouts included)
    ///
    /// Callers that only distinguish "network trouble" from everything else can use
    /// this instead of matching on [`ErrorKind::Timeout`] separately.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport | ErrorKind::Timeout)
    }

    /// Get the machine-readable error code
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport(_) => "transport_error",
            Error::Timeout { .. } => "timeout",
            Error::Status { .. } => "status_error",
            Error::ProtocolViolation { .. } => "protocol_violation",
            Error::Cancelled => "cancelled",
            Error::ShuttingDown => "shutting_down",
        }
    }
}
