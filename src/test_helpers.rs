//! Shared test helpers: an in-memory transport with scripted replies.

use crate::client::{Client, OnRegistered};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::protocol::Endpoint;
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned reply for one call
#[derive(Clone, Debug)]
pub(crate) enum Reply {
    /// Answer with a status and body
    Respond(u16, String),
    /// Fail as if the timeout elapsed
    Timeout,
    /// Fail as if the connection was refused
    Refused,
    /// Wait, then give the inner reply
    Delayed(Duration, Box<Reply>),
}

impl Reply {
    pub(crate) fn ok(body: impl Into<String>) -> Self {
        Reply::Respond(200, body.into())
    }

    pub(crate) fn gold(bucket_id: &str, units: u64) -> Self {
        Reply::ok(format!(r#"{{"bucketId":"{bucket_id}","gold":{{"units":{units}}}}}"#))
    }

    pub(crate) fn dirt(bucket_id: &str, units: u64) -> Self {
        Reply::ok(format!(r#"{{"bucketId":"{bucket_id}","dirt":{{"units":{units}}}}}"#))
    }

    pub(crate) fn status(status: u16) -> Self {
        Reply::Respond(status, String::new())
    }
}

/// A recorded call
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Call {
    pub(crate) endpoint: Endpoint,
    pub(crate) query: Vec<(String, String)>,
}

impl Call {
    pub(crate) fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Script {
    queued: HashMap<Endpoint, VecDeque<Reply>>,
    fallback: HashMap<Endpoint, Reply>,
    calls: Vec<Call>,
}

/// Transport that answers from per-endpoint scripts and records every call
///
/// Queued replies are used first, in order; once an endpoint's queue is empty its
/// fallback reply repeats. An endpoint with neither answers 404.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, endpoint: Endpoint, reply: Reply) -> &Self {
        self.script
            .lock()
            .unwrap()
            .queued
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }

    pub(crate) fn fallback(&self, endpoint: Endpoint, reply: Reply) -> &Self {
        self.script.lock().unwrap().fallback.insert(endpoint, reply);
        self
    }

    /// Highest number of calls that were outstanding at the same time
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub(crate) fn calls_to(&self, endpoint: Endpoint) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.endpoint == endpoint)
            .collect()
    }

    fn next_reply(&self, call: Call) -> Reply {
        let mut script = self.script.lock().unwrap();
        let endpoint = call.endpoint;
        script.calls.push(call);
        if let Some(reply) = script.queued.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            return reply;
        }
        script
            .fallback
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| Reply::status(404))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<TransportResponse> {
        let call = Call {
            endpoint,
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let reply = self.next_reply(call);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = play(reply).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

async fn play(mut reply: Reply) -> Result<TransportResponse> {
    loop {
        match reply {
            Reply::Respond(status, body) => return Ok(TransportResponse::new(status, body)),
            Reply::Timeout => {
                return Err(Error::Timeout {
                    after: Duration::from_millis(1000),
                });
            }
            Reply::Refused => {
                return Err(Error::Transport("connection refused".to_string()));
            }
            Reply::Delayed(delay, inner) => {
                tokio::time::sleep(delay).await;
                reply = *inner;
            }
        }
    }
}

pub(crate) fn test_config() -> ClientConfig {
    let mut config = ClientConfig::new("https://example.com/test-base-url", "test-user-name");
    config.user_id = Some("test-user-id".to_string());
    config
}

/// Client over `transport` with the supplied test user id
pub(crate) async fn create_test_client(transport: &ScriptedTransport) -> Client {
    create_client_with(test_config(), transport, None).await.unwrap()
}

pub(crate) async fn create_client_with(
    config: ClientConfig,
    transport: &ScriptedTransport,
    on_registered: Option<OnRegistered>,
) -> Result<Client> {
    Client::with_transport(config, Arc::new(transport.clone()), on_registered).await
}
