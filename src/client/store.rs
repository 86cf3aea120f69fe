//! Reporting gold back to the service.

use super::Client;
use super::callbacks::{PendingRequest, StoreCompletion, StoreHandler};
use crate::error::Result;
use crate::protocol::{self, Endpoint};
use crate::types::{BucketId, StoreOutcome};

impl Client {
    /// Store a bucket under this client's user id
    ///
    /// `units` is not sent to the server; it is carried for logging and for the
    /// callers' bookkeeping.
    ///
    /// # Errors
    ///
    /// A body other than `true` is an [`Error::ProtocolViolation`](crate::Error::ProtocolViolation),
    /// distinct from transport and status failures.
    pub async fn store(&self, bucket_id: &BucketId, units: u64) -> Result<StoreOutcome> {
        let user_id = self.resolve_user_id().await?;

        let response = self
            .transport
            .post(
                Endpoint::Store,
                &[("userId", user_id.as_str()), ("bucketId", bucket_id.as_str())],
            )
            .await?;
        let body = response.into_ok_body()?;
        protocol::parse_store(&body)?;

        tracing::debug!(bucket_id = %bucket_id, units, "Stored bucket");
        Ok(StoreOutcome { accepted: true })
    }

    /// Store on a spawned task, reporting through `handler`
    ///
    /// The bucket id and units are passed through to every callback.
    pub fn store_with<H: StoreHandler>(
        &self,
        bucket_id: BucketId,
        units: u64,
        handler: H,
    ) -> tokio::task::JoinHandle<()> {
        let client = self.clone();
        let pending = PendingRequest::new(StoreCompletion {
            handler,
            bucket_id: bucket_id.clone(),
            units,
        });
        tokio::spawn(async move {
            let outcome = client.store(&bucket_id, units).await;
            pending.resolve(outcome);
        })
    }
}
