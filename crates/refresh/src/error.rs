//! Fetch errors.

use crate::signal::SignalKind;
use std::time::Duration;
use thiserror::Error;

/// Why a signal fetch produced no value. Absorbed by the orchestrator; the
/// signal degrades to `Unavailable` for the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("fetch failed: {0}")]
    Failed(String),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("no fetcher registered for {0}")]
    Unregistered(SignalKind),
}

impl FetchError {
    pub fn failed(reason: impl Into<String>) -> Self {
        FetchError::Failed(reason.into())
    }
}

/// Result type for signal fetches.
pub type FetchResult<T> = Result<T, FetchError>;
