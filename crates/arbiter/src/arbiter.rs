//! Collect-then-prioritize arbitration.
//!
//! Providers are consulted in priority order. An actively playing result
//! from any provider wins immediately; otherwise the first paused result by
//! priority is kept while the scan continues, and a last-resort fallback is
//! consulted once at the end.

use crate::provider::{MediaProviderRef, ProviderSlot, DEFAULT_PROVIDER_TIMEOUT};
use crate::snapshot::{MediaSnapshot, ProviderResult};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Default budget for the fallback provider.
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(2);

/// How providers are invoked within one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArbitrationStrategy {
    /// One at a time in priority order; stops at the first playing result.
    #[default]
    Sequential,
    /// All at once; results are reduced in priority order, not arrival order.
    Concurrent,
}

/// Ordered-list reduction over provider results.
///
/// Feed results in priority order with [`Reduction::push`].
#[derive(Debug, Default)]
pub struct Reduction {
    best_paused: Option<MediaSnapshot>,
}

impl Reduction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next result by priority. Breaks with the snapshot when it
    /// is actively playing.
    pub fn push(&mut self, result: ProviderResult) -> ControlFlow<MediaSnapshot> {
        match result {
            ProviderResult::Success(snapshot) if snapshot.is_playing => {
                ControlFlow::Break(snapshot)
            }
            ProviderResult::Success(snapshot) => {
                if self.best_paused.is_none() {
                    self.best_paused = Some(snapshot);
                }
                ControlFlow::Continue(())
            }
            ProviderResult::Empty | ProviderResult::Failed(_) | ProviderResult::TimedOut => {
                ControlFlow::Continue(())
            }
        }
    }

    pub fn best_paused(&self) -> Option<&MediaSnapshot> {
        self.best_paused.as_ref()
    }

    /// Settle the pass with the fallback provider's result.
    ///
    /// Fallback playing wins; otherwise the best paused candidate, then the
    /// fallback's own paused value, then nothing.
    pub fn finish(self, fallback: Option<ProviderResult>) -> Option<MediaSnapshot> {
        match fallback {
            Some(ProviderResult::Success(snapshot)) if snapshot.is_playing => Some(snapshot),
            Some(ProviderResult::Success(snapshot)) => self.best_paused.or(Some(snapshot)),
            _ => self.best_paused,
        }
    }
}

/// Reduce a complete, priority-ordered result list (fallback excluded).
pub fn reduce<I>(results: I) -> (Option<MediaSnapshot>, Reduction)
where
    I: IntoIterator<Item = ProviderResult>,
{
    let mut reduction = Reduction::new();
    for result in results {
        if let ControlFlow::Break(playing) = reduction.push(result) {
            return (Some(playing), reduction);
        }
    }
    (None, reduction)
}

/// Resolves the single "now playing" snapshot across providers.
#[derive(Debug, Default)]
pub struct SourceArbiter {
    providers: Vec<ProviderSlot>,
    fallback: Option<ProviderSlot>,
    strategy: ArbitrationStrategy,
}

impl SourceArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider at the next-lower priority, with the default timeout.
    pub fn with_provider(self, provider: MediaProviderRef) -> Self {
        self.with_provider_timeout(provider, DEFAULT_PROVIDER_TIMEOUT)
    }

    /// Append a provider at the next-lower priority.
    pub fn with_provider_timeout(mut self, provider: MediaProviderRef, timeout: Duration) -> Self {
        self.providers.push(ProviderSlot::new(provider, timeout));
        self
    }

    /// Set the last-resort provider consulted once after all others.
    pub fn with_fallback(mut self, provider: MediaProviderRef, timeout: Duration) -> Self {
        self.fallback = Some(ProviderSlot::new(provider, timeout));
        self
    }

    pub fn with_strategy(mut self, strategy: ArbitrationStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn providers(&self) -> &[ProviderSlot] {
        &self.providers
    }

    pub fn strategy(&self) -> ArbitrationStrategy {
        self.strategy
    }

    /// Longest one pass can take when every provider and the fallback run
    /// into their timeouts.
    pub fn budget(&self) -> Duration {
        let timeouts = self.providers.iter().map(|slot| slot.timeout);
        let providers = match self.strategy {
            ArbitrationStrategy::Sequential => timeouts.sum(),
            ArbitrationStrategy::Concurrent => timeouts.max().unwrap_or_default(),
        };
        let fallback = self.fallback.as_ref().map_or(Duration::ZERO, |slot| slot.timeout);
        providers + fallback
    }

    /// Run one arbitration pass.
    pub async fn resolve(&self, cancel: &CancellationToken) -> Option<MediaSnapshot> {
        let reduction = match self.strategy {
            ArbitrationStrategy::Sequential => {
                let mut reduction = Reduction::new();
                for slot in &self.providers {
                    let result = slot.invoke(cancel).await;
                    log_result(slot, &result);
                    if let ControlFlow::Break(playing) = reduction.push(result) {
                        return Some(playing);
                    }
                }
                reduction
            }
            ArbitrationStrategy::Concurrent => {
                let results =
                    futures::future::join_all(self.providers.iter().map(|slot| slot.invoke(cancel)))
                        .await;
                for (slot, result) in self.providers.iter().zip(&results) {
                    log_result(slot, result);
                }
                match reduce(results) {
                    (Some(playing), _) => return Some(playing),
                    (None, reduction) => reduction,
                }
            }
        };

        if cancel.is_cancelled() {
            return reduction.finish(None);
        }

        let fallback = match &self.fallback {
            Some(slot) => {
                let result = slot.invoke(cancel).await;
                log_result(slot, &result);
                Some(result)
            }
            None => None,
        };

        reduction.finish(fallback)
    }
}

fn log_result(slot: &ProviderSlot, result: &ProviderResult) {
    match result.as_error(slot.name()) {
        Some(err) => tracing::debug!(error = %err, "media provider skipped"),
        None => tracing::trace!(provider = slot.name(), outcome = result.label(), "media provider answered"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MediaProvider;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider that returns a fixed result after an optional delay.
    struct Scripted {
        name: &'static str,
        result: ProviderResult,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(name: &'static str, result: ProviderResult) -> Arc<Self> {
            Self::delayed(name, result, Duration::ZERO)
        }

        fn delayed(name: &'static str, result: ProviderResult, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                result,
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn attempt(&self, _cancel: &CancellationToken) -> ProviderResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.result.clone()
        }
    }

    fn playing(source: &str) -> ProviderResult {
        ProviderResult::Success(MediaSnapshot::new(source, "track", true))
    }

    fn paused(source: &str) -> ProviderResult {
        ProviderResult::Success(MediaSnapshot::new(source, "track", false))
    }

    #[tokio::test(start_paused = true)]
    async fn test_playing_lower_priority_beats_paused() {
        let p1 = Scripted::new("p1", paused("P1"));
        let p2 = Scripted::new("p2", playing("P2"));
        let p3 = Scripted::delayed("p3", playing("P3"), Duration::from_secs(10));

        let arbiter = SourceArbiter::new()
            .with_provider(p1.clone())
            .with_provider(p2.clone())
            .with_provider_timeout(p3.clone(), Duration::from_millis(500));

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "P2");
        // Short-circuit: p3 never consulted.
        assert_eq!(p3.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_paused_by_priority_wins() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", paused("P1")))
            .with_provider(Scripted::new("p2", ProviderResult::Empty))
            .with_provider(Scripted::new("p3", paused("P3")));

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "P1");
        assert!(!winner.is_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_playing_when_all_fail() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", ProviderResult::Failed("denied".into())))
            .with_provider_timeout(
                Scripted::delayed("p2", playing("P2"), Duration::from_secs(5)),
                Duration::from_millis(300),
            )
            .with_provider(Scripted::new("p3", ProviderResult::Empty))
            .with_fallback(Scripted::new("os", playing("OS")), DEFAULT_FALLBACK_TIMEOUT);

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "OS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_playing_beats_paused_candidate() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", paused("P1")))
            .with_fallback(Scripted::new("os", playing("OS")), DEFAULT_FALLBACK_TIMEOUT);

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "OS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_candidate_beats_paused_fallback() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", paused("P1")))
            .with_fallback(Scripted::new("os", paused("OS")), DEFAULT_FALLBACK_TIMEOUT);

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "P1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_fallback_used_when_nothing_else() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", ProviderResult::Empty))
            .with_fallback(Scripted::new("os", paused("OS")), DEFAULT_FALLBACK_TIMEOUT);

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "OS");
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_playing_anywhere() {
        let fallback = Scripted::new("os", ProviderResult::TimedOut);
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", ProviderResult::Empty))
            .with_fallback(fallback.clone(), DEFAULT_FALLBACK_TIMEOUT);

        assert!(arbiter.resolve(&CancellationToken::new()).await.is_none());
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_reduces_in_priority_order() {
        // P3 answers first but P2 outranks it.
        let arbiter = SourceArbiter::new()
            .with_strategy(ArbitrationStrategy::Concurrent)
            .with_provider(Scripted::new("p1", paused("P1")))
            .with_provider(Scripted::delayed("p2", playing("P2"), Duration::from_millis(400)))
            .with_provider(Scripted::delayed("p3", playing("P3"), Duration::from_millis(10)));

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "P2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_block_pass() {
        let start = tokio::time::Instant::now();
        let arbiter = SourceArbiter::new()
            .with_provider_timeout(
                Scripted::delayed("hung", playing("Hung"), Duration::from_secs(3600)),
                Duration::from_millis(250),
            )
            .with_provider(Scripted::new("p2", paused("P2")));

        let winner = arbiter.resolve(&CancellationToken::new()).await.unwrap();
        assert_eq!(winner.source_label, "P2");
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_budget_covers_worst_case_pass() {
        let arbiter = SourceArbiter::new()
            .with_provider(Scripted::new("p1", paused("P1")))
            .with_provider(Scripted::new("p2", paused("P2")))
            .with_provider_timeout(Scripted::new("p3", paused("P3")), Duration::from_secs(4))
            .with_fallback(Scripted::new("fb", playing("FB")), DEFAULT_FALLBACK_TIMEOUT);
        assert_eq!(arbiter.budget(), Duration::from_secs(9));

        let arbiter = arbiter.with_strategy(ArbitrationStrategy::Concurrent);
        assert_eq!(arbiter.budget(), Duration::from_secs(6));

        assert_eq!(SourceArbiter::new().budget(), Duration::ZERO);
    }

    #[test]
    fn test_reduce_short_circuits() {
        let (winner, reduction) = reduce(vec![
            paused("A"),
            playing("B"),
            playing("C"),
        ]);
        assert_eq!(winner.unwrap().source_label, "B");
        assert_eq!(reduction.best_paused().unwrap().source_label, "A");
    }

    #[test]
    fn test_reduce_ignores_failures_for_paused_candidate() {
        let (winner, reduction) = reduce(vec![
            ProviderResult::TimedOut,
            ProviderResult::Failed("x".into()),
            paused("C"),
            paused("D"),
        ]);
        assert!(winner.is_none());
        assert_eq!(reduction.best_paused().unwrap().source_label, "C");
    }
}
