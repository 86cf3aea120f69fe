//! Common test utilities for resilint integration tests

use resilint::{ClientConfig, Event, Orchestrator};
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_ID: &str = "u-1234";

/// Client configuration pointing at a mock server, with the user id supplied
pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(server.uri(), "digger");
    config.user_id = Some(USER_ID.to_string());
    config
}

pub fn gold(bucket_id: &str, units: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"{{"bucketId":"{bucket_id}","gold":{{"units":{units}}}}}"#
    ))
}

pub fn dirt(bucket_id: &str, units: u64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        r#"{{"bucketId":"{bucket_id}","dirt":{{"units":{units}}}}}"#
    ))
}

/// Answer every excavate with dirt after `delay`
///
/// Mounted at low priority so one-off gold mocks take precedence.
pub async fn mount_idle_excavate(server: &MockServer, delay: Duration) {
    Mock::given(method("POST"))
        .and(path("/v1/excavate"))
        .respond_with(dirt("dirt", 3).set_delay(delay))
        .with_priority(10)
        .mount(server)
        .await;
}

/// Wait for the first event matching `pred`
///
/// Returns `None` on timeout or when the channel closes.
pub async fn wait_for_event<F>(
    events: &mut broadcast::Receiver<Event>,
    timeout: Duration,
    mut pred: F,
) -> Option<Event>
where
    F: FnMut(&Event) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Requests the mock server received on `endpoint_path`, as query pair lists
pub async fn queries_to(server: &MockServer, endpoint_path: &str) -> Vec<Vec<(String, String)>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == endpoint_path)
        .map(|r| r.url.query_pairs().into_owned().collect())
        .collect()
}

/// Shut down, failing the test if the drain hangs
pub async fn shutdown(orchestrator: &Orchestrator) -> resilint::AccumulatedStats {
    tokio::time::timeout(Duration::from_secs(10), orchestrator.shutdown())
        .await
        .expect("shutdown did not finish")
}
