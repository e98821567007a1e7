//! Media provider trait.
//!
//! Every external now-playing source (native player, browser tab, OS media
//! session) implements [`MediaProvider`] and reports a [`ProviderResult`].
//! Timeouts are enforced by the caller, not the provider.

use crate::snapshot::ProviderResult;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default budget for a single provider attempt.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_millis(1500);

/// One external now-playing source.
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Human-readable name for logs.
    fn name(&self) -> &str;

    /// Attempt to read the source.
    ///
    /// Implementations should stop work promptly once `cancel` fires; the
    /// future may also simply be dropped.
    async fn attempt(&self, cancel: &CancellationToken) -> ProviderResult;
}

/// Type alias for a shared provider reference.
pub type MediaProviderRef = Arc<dyn MediaProvider>;

/// A provider together with its timeout.
#[derive(Clone)]
pub struct ProviderSlot {
    pub provider: MediaProviderRef,
    pub timeout: Duration,
}

impl ProviderSlot {
    pub fn new(provider: MediaProviderRef, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Run one bounded attempt. Exceeding the timeout yields
    /// [`ProviderResult::TimedOut`]; cancellation yields a failure.
    pub async fn invoke(&self, cancel: &CancellationToken) -> ProviderResult {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => ProviderResult::Failed("cancelled".to_string()),
            result = tokio::time::timeout(self.timeout, self.provider.attempt(cancel)) => {
                result.unwrap_or(ProviderResult::TimedOut)
            }
        }
    }
}

impl std::fmt::Debug for ProviderSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSlot")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
