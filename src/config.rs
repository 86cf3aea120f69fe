//! Configuration types for resilint

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Connection settings for a [`Client`](crate::Client)
///
/// Immutable once the client is built. The only piece of client state that changes
/// afterwards is the resolved user id, which lives in the client itself.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the service, e.g. `https://resilient-integration-workshop.herokuapp.com`
    ///
    /// May carry a path prefix; endpoint paths (`/v1/...`) are appended to it.
    pub base_url: String,

    /// Name sent to the registration endpoint
    pub user_name: String,

    /// Previously issued user id (None or empty = register on construction)
    #[serde(default)]
    pub user_id: Option<String>,

    /// Per-request timeout (default: 1000ms)
    #[serde(
        default = "default_timeout",
        rename = "timeout_ms",
        with = "duration_ms_serde"
    )]
    pub timeout: Duration,
}

impl ClientConfig {
    /// Create a config with default timeout and no stored user id
    pub fn new(base_url: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_name: user_name.into(),
            user_id: None,
            timeout: default_timeout(),
        }
    }

    /// Supplied user id, if present and non-empty
    pub fn supplied_user_id(&self) -> Option<&str> {
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Parse and check the base URL
    pub fn parsed_base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid base URL: {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::config(
                    "base_url",
                    format!("unsupported scheme '{other}', expected http or https"),
                ));
            }
        }
        if url.cannot_be_a_base() {
            return Err(Error::config("base_url", "URL cannot be used as a base"));
        }
        Ok(url)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        self.parsed_base_url()?;
        if self.user_name.trim().is_empty() {
            return Err(Error::config("user_name", "user name must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout_ms", "timeout must be greater than zero"));
        }
        Ok(())
    }
}

/// Settings for the [`Orchestrator`](crate::Orchestrator)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Number of excavate calls kept in flight (default: 30)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Retry policy for failed store calls
    #[serde(default)]
    pub store_retry: RetryConfig,

    /// Upper bound on waiting for in-flight work during shutdown (default: 30s)
    #[serde(default = "default_drain_timeout", with = "duration_ms_serde")]
    pub drain_timeout: Duration,

    /// Capacity of the event broadcast channel (default: 1024)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            store_retry: RetryConfig::default(),
            drain_timeout: default_drain_timeout(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl OrchestratorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::config("concurrency", "concurrency must be at least 1"));
        }
        if self.event_capacity == 0 {
            return Err(Error::config(
                "event_capacity",
                "event channel capacity must be at least 1",
            ));
        }
        self.store_retry.validate()
    }
}

/// Retry configuration for failed store calls
///
/// Stores are idempotent on the server, so the default keeps retrying until the
/// store succeeds (`max_attempts: None`). The delay between attempts grows
/// exponentially up to `max_delay`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt (None = unlimited)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Delay before the first retry (default: 50ms)
    #[serde(default = "default_initial_delay", with = "duration_ms_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 5 seconds)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry immediately and forever: no delay, no cap
    ///
    /// A failed store is re-issued as soon as its failure has been reported.
    pub fn immediate() -> Self {
        Self {
            max_attempts: None,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            jitter: false,
        }
    }

    /// Validate the retry settings
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "store_retry.backoff_multiplier",
                "backoff multiplier must be a finite number >= 1.0",
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err(Error::config(
                "store_retry.initial_delay",
                "initial delay must not exceed max delay",
            ));
        }
        Ok(())
    }
}

fn default_timeout() -> Duration {
    Duration::from_millis(1000)
}

fn default_concurrency() -> usize {
    30
}

fn default_drain_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_event_capacity() -> usize {
    1024
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(50)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Durations are written as integer milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("http://localhost:1234/test-base-url", "test-username")
    }

    #[test]
    fn defaults_match_workshop_driver() {
        let orchestrator = OrchestratorConfig::default();
        assert_eq!(orchestrator.concurrency, 30);
        assert_eq!(orchestrator.store_retry.max_attempts, None);
        assert_eq!(config().timeout, Duration::from_secs(1));
    }

    #[test]
    fn valid_config_passes() {
        config().validate().unwrap();
        OrchestratorConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_unparsable_base_url() {
        let mut cfg = config();
        cfg.base_url = "not a url".to_string();
        match cfg.validate().unwrap_err() {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("base_url")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_http_scheme() {
        let mut cfg = config();
        cfg.base_url = "ftp://example.com".to_string();
        assert!(matches!(cfg.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn rejects_empty_user_name_and_zero_timeout() {
        let mut cfg = config();
        cfg.user_name = "   ".to_string();
        assert!(matches!(cfg.validate(), Err(Error::Config { key: Some(k), .. }) if k == "user_name"));

        let mut cfg = config();
        cfg.timeout = Duration::ZERO;
        assert!(matches!(cfg.validate(), Err(Error::Config { key: Some(k), .. }) if k == "timeout_ms"));
    }

    #[test]
    fn rejects_zero_concurrency() {
        let cfg = OrchestratorConfig {
            concurrency: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(Error::Config { key: Some(k), .. }) if k == "concurrency"));
    }

    #[test]
    fn rejects_shrinking_backoff() {
        let retry = RetryConfig {
            backoff_multiplier: 0.5,
            ..Default::default()
        };
        assert!(retry.validate().is_err());
        RetryConfig::immediate().validate().unwrap();
    }

    #[test]
    fn empty_user_id_counts_as_absent() {
        let mut cfg = config();
        cfg.user_id = Some(String::new());
        assert_eq!(cfg.supplied_user_id(), None);
        cfg.user_id = Some("abc123".to_string());
        assert_eq!(cfg.supplied_user_id(), Some("abc123"));
    }

    #[test]
    fn deserializes_with_defaults_and_millisecond_timeout() {
        let json = r#"{"base_url":"https://example.com","user_name":"JoshCheek","timeout_ms":250}"#;
        let cfg: ClientConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.timeout, Duration::from_millis(250));
        assert_eq!(cfg.user_id, None);

        let orchestrator: OrchestratorConfig =
            serde_json::from_str(r#"{"concurrency":4,"store_retry":{"max_attempts":3}}"#).unwrap();
        assert_eq!(orchestrator.concurrency, 4);
        assert_eq!(orchestrator.store_retry.max_attempts, Some(3));
        assert_eq!(orchestrator.store_retry.initial_delay, Duration::from_millis(50));
        assert_eq!(orchestrator.drain_timeout, Duration::from_secs(30));
    }

    #[test]
    fn serializes_timeout_as_millis() {
        let value = serde_json::to_value(config()).unwrap();
        assert_eq!(value["timeout_ms"], 1000);
    }
}
