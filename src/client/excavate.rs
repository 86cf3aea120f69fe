//! Digging up buckets.

use super::Client;
use super::callbacks::{ExcavateCompletion, ExcavateHandler, PendingRequest};
use crate::error::Result;
use crate::protocol::{self, Endpoint};
use crate::types::ExcavationResult;

impl Client {
    /// Excavate one bucket
    ///
    /// # Errors
    ///
    /// - [`Error::Transport`](crate::Error::Transport) / [`Error::Timeout`](crate::Error::Timeout) on network failure
    /// - [`Error::Status`](crate::Error::Status) on a non-200 response
    /// - [`Error::ProtocolViolation`](crate::Error::ProtocolViolation) when the body is not a single gold or dirt bucket
    pub async fn excavate(&self) -> Result<ExcavationResult> {
        let response = self.transport.post(Endpoint::Excavate, &[]).await?;
        let body = response.into_ok_body()?;
        let result = protocol::parse_excavation(&body)?;

        tracing::debug!(
            bucket_id = %result.bucket_id,
            kind = ?result.kind,
            units = result.units,
            value = result.value(),
            "Excavated bucket"
        );
        Ok(result)
    }

    /// Excavate on a spawned task, reporting through `handler`
    ///
    /// Exactly one of `on_success`/`on_failure` fires, then `on_complete`. Aborting
    /// the returned handle reports [`Error::Cancelled`](crate::Error::Cancelled).
    pub fn excavate_with<H: ExcavateHandler>(&self, handler: H) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        let pending = PendingRequest::new(ExcavateCompletion(handler));
        tokio::spawn(async move {
            let outcome = client.excavate().await;
            pending.resolve(outcome);
        })
    }
}
