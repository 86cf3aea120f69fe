//! Callback-style completion for excavate and store calls.
//!
//! The async methods on [`Client`](super::Client) return a `Result`. These adapters
//! turn that into the success/failure/completion triple: a [`PendingRequest`] owns
//! the handler for one in-flight call and is consumed by the first outcome, so a
//! second outcome has nothing left to report to.

use crate::error::{Error, Result};
use crate::types::{BucketId, ExcavationResult, StoreOutcome};

/// Receives the outcome of [`Client::excavate_with`](super::Client::excavate_with)
pub trait ExcavateHandler: Send + 'static {
    /// The call produced a bucket
    fn on_success(&mut self, result: ExcavationResult);

    /// The call failed
    fn on_failure(&mut self, error: Error);

    /// Runs once after `on_success` or `on_failure`
    fn on_complete(&mut self) {}
}

/// Receives the outcome of [`Client::store_with`](super::Client::store_with)
pub trait StoreHandler: Send + 'static {
    /// The server accepted the bucket
    fn on_success(&mut self, bucket_id: &BucketId, units: u64);

    /// The store failed
    fn on_failure(&mut self, error: Error, bucket_id: &BucketId, units: u64);

    /// Runs once after `on_success` or `on_failure`
    fn on_complete(&mut self, _bucket_id: &BucketId, _units: u64) {}
}

/// Terminal reporting for one kind of request
pub(crate) trait Completion: Send + 'static {
    type Output;

    fn succeed(&mut self, output: Self::Output);
    fn fail(&mut self, error: Error);
    fn complete(&mut self);
}

pub(crate) struct ExcavateCompletion<H>(pub(crate) H);

impl<H: ExcavateHandler> Completion for ExcavateCompletion<H> {
    type Output = ExcavationResult;

    fn succeed(&mut self, output: ExcavationResult) {
        self.0.on_success(output);
    }

    fn fail(&mut self, error: Error) {
        self.0.on_failure(error);
    }

    fn complete(&mut self) {
        self.0.on_complete();
    }
}

pub(crate) struct StoreCompletion<H> {
    pub(crate) handler: H,
    pub(crate) bucket_id: BucketId,
    pub(crate) units: u64,
}

impl<H: StoreHandler> Completion for StoreCompletion<H> {
    type Output = StoreOutcome;

    fn succeed(&mut self, _output: StoreOutcome) {
        self.handler.on_success(&self.bucket_id, self.units);
    }

    fn fail(&mut self, error: Error) {
        self.handler.on_failure(error, &self.bucket_id, self.units);
    }

    fn complete(&mut self) {
        self.handler.on_complete(&self.bucket_id, self.units);
    }
}

/// In-flight state for exactly one outstanding call
///
/// Resolving consumes the request. Dropping it unresolved (the task was aborted)
/// reports [`Error::Cancelled`] so completion still runs once.
pub(crate) struct PendingRequest<C: Completion> {
    completion: Option<C>,
}

impl<C: Completion> PendingRequest<C> {
    pub(crate) fn new(completion: C) -> Self {
        Self {
            completion: Some(completion),
        }
    }

    pub(crate) fn resolve(mut self, outcome: Result<C::Output>) {
        if let Some(completion) = self.completion.take() {
            finish(completion, outcome);
        }
    }
}

impl<C: Completion> Drop for PendingRequest<C> {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            finish(completion, Err(Error::Cancelled));
        }
    }
}

fn finish<C: Completion>(mut completion: C, outcome: Result<C::Output>) {
    match outcome {
        Ok(output) => completion.succeed(output),
        Err(error) => completion.fail(error),
    }
    completion.complete();
}
