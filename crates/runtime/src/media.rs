//! Media signal backed by the source arbiter.

use async_trait::async_trait;
use perch_arbiter::SourceArbiter;
use perch_refresh::{FetchError, FetchResult, SignalFetcher, SignalValue};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs one arbitration pass per fetch.
pub struct MediaFetcher {
    arbiter: Arc<SourceArbiter>,
}

impl MediaFetcher {
    pub fn new(arbiter: Arc<SourceArbiter>) -> Self {
        Self { arbiter }
    }
}

#[async_trait]
impl SignalFetcher for MediaFetcher {
    async fn fetch(&self, cancel: CancellationToken) -> FetchResult<SignalValue> {
        let winner = self.arbiter.resolve(&cancel).await;
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        Ok(SignalValue::Media(winner))
    }

    fn budget(&self) -> Option<Duration> {
        Some(self.arbiter.budget())
    }
}
