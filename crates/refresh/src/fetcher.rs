//! Signal fetcher trait.

use crate::error::FetchResult;
use crate::value::SignalValue;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Produces a fresh value for one signal.
///
/// Runs on a spawned task. The orchestrator enforces the timeout and drops
/// the future on cancel, so implementations need not do either.
#[async_trait]
pub trait SignalFetcher: Send + Sync {
    async fn fetch(&self, cancel: CancellationToken) -> FetchResult<SignalValue>;

    /// Worst-case duration of a fetch that bounds its own work. The
    /// orchestrator never times such a fetch out before this has elapsed.
    fn budget(&self) -> Option<Duration> {
        None
    }
}

pub type SignalFetcherRef = Arc<dyn SignalFetcher>;

/// Fetcher that always returns the same value.
pub struct StaticFetcher {
    value: SignalValue,
}

impl StaticFetcher {
    pub fn new(value: SignalValue) -> Self {
        Self { value }
    }
}

#[async_trait]
impl SignalFetcher for StaticFetcher {
    async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
        Ok(self.value.clone())
    }
}
