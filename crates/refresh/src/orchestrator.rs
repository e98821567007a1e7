//! One shared clock, one schedule table.
//!
//! The orchestrator never awaits a fetch. `tick` starts due fetches on
//! spawned tasks; each task reports back a [`FetchCompletion`] over the
//! channel given at construction, which the decision loop hands to
//! [`RefreshOrchestrator::complete`].

use crate::config::SignalsConfig;
use crate::error::FetchError;
use crate::fetcher::SignalFetcherRef;
use crate::schedule::SignalSchedule;
use crate::signal::SignalKind;
use crate::value::{SignalState, SignalValue};
use perch_activation::ActivationMode;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Result of one fetch attempt, tagged with the generation it was started in.
#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub kind: SignalKind,
    pub generation: u64,
    pub outcome: Result<SignalValue, FetchError>,
}

pub type CompletionSender = mpsc::UnboundedSender<FetchCompletion>;

/// Headroom over a fetcher's own budget before the outer timeout fires.
const BUDGET_GRACE: Duration = Duration::from_millis(250);

/// Configured timeout, raised to cover a fetcher that enforces its own limits.
fn effective_timeout(configured: Duration, budget: Option<Duration>) -> Duration {
    budget.map_or(configured, |budget| configured.max(budget + BUDGET_GRACE))
}

/// Schedules signal fetches against a shared clock.
pub struct RefreshOrchestrator {
    schedules: BTreeMap<SignalKind, SignalSchedule>,
    states: BTreeMap<SignalKind, SignalState>,
    fetchers: HashMap<SignalKind, SignalFetcherRef>,
    completions: CompletionSender,
    shutdown: CancellationToken,
    missing_logged: HashSet<SignalKind>,
}

impl RefreshOrchestrator {
    pub fn new(config: &SignalsConfig, completions: CompletionSender) -> Self {
        let schedules = SignalKind::ALL
            .iter()
            .map(|kind| (*kind, SignalSchedule::new(*kind, config.get(*kind))))
            .collect::<BTreeMap<_, _>>();
        let states = schedules
            .iter()
            .map(|(kind, schedule)| {
                let state = if schedule.enabled {
                    SignalState::Unavailable
                } else {
                    SignalState::Hidden
                };
                (*kind, state)
            })
            .collect();

        Self {
            schedules,
            states,
            fetchers: HashMap::new(),
            completions,
            shutdown: CancellationToken::new(),
            missing_logged: HashSet::new(),
        }
    }

    /// Register the fetcher for a signal, replacing any previous one.
    pub fn register(&mut self, kind: SignalKind, fetcher: SignalFetcherRef) {
        self.fetchers.insert(kind, fetcher);
        self.missing_logged.remove(&kind);
    }

    /// Evaluate every signal once. Returns the signals whose fetch started.
    pub fn tick(&mut self, now: Instant, mode: ActivationMode) -> Vec<SignalKind> {
        if self.shutdown.is_cancelled() {
            return Vec::new();
        }

        let mut started = Vec::new();
        for kind in SignalKind::ALL {
            let Some(schedule) = self.schedules.get_mut(&kind) else {
                continue;
            };

            if !schedule.enabled {
                self.states.insert(kind, SignalState::Hidden);
                continue;
            }
            if mode == ActivationMode::Collapsed && !kind.runs_while_collapsed() {
                continue;
            }
            if schedule.in_flight || !schedule.is_due(now) {
                continue;
            }

            let Some(fetcher) = self.fetchers.get(&kind) else {
                if self.missing_logged.insert(kind) {
                    let err = FetchError::Unregistered(kind);
                    tracing::warn!(signal = %kind, error = %err, "signal unavailable");
                }
                schedule.force = false;
                schedule.last_fetch = Some(now);
                self.states.insert(kind, SignalState::Unavailable);
                continue;
            };

            let cancel = self.shutdown.child_token();
            schedule.in_flight = true;
            schedule.force = false;
            schedule.cancel = Some(cancel.clone());

            spawn_fetch(
                kind,
                schedule.generation,
                effective_timeout(schedule.timeout, fetcher.budget()),
                fetcher.clone(),
                cancel,
                self.completions.clone(),
            );
            tracing::trace!(signal = %kind, generation = schedule.generation, "fetch started");
            started.push(kind);
        }
        started
    }

    /// Apply a finished fetch. Returns false when it was stale and ignored.
    pub fn complete(&mut self, now: Instant, completion: FetchCompletion) -> bool {
        let FetchCompletion {
            kind,
            generation,
            outcome,
        } = completion;

        let Some(schedule) = self.schedules.get_mut(&kind) else {
            return false;
        };
        if generation != schedule.generation || !schedule.in_flight {
            tracing::debug!(signal = %kind, generation, current = schedule.generation, "discarding stale completion");
            return false;
        }

        schedule.in_flight = false;
        schedule.cancel = None;
        // Failures wait for the next cadence boundary like successes do.
        schedule.last_fetch = Some(now);

        let state = match outcome {
            Ok(value) => SignalState::Ready(value),
            Err(FetchError::Cancelled) => {
                tracing::debug!(signal = %kind, "fetch cancelled");
                SignalState::Unavailable
            }
            Err(e) => {
                tracing::warn!(signal = %kind, error = %e, "signal fetch failed");
                SignalState::Unavailable
            }
        };
        self.states.insert(kind, state);
        true
    }

    /// Toggle a signal's gate.
    ///
    /// Off cancels any in-flight fetch and hides the value. On forces a fetch
    /// at the next tick.
    pub fn set_enabled(&mut self, kind: SignalKind, enabled: bool) {
        let Some(schedule) = self.schedules.get_mut(&kind) else {
            return;
        };
        if schedule.enabled == enabled {
            return;
        }

        schedule.enabled = enabled;
        if enabled {
            schedule.force = true;
            self.states.insert(kind, SignalState::Unavailable);
        } else {
            schedule.abandon(Instant::now());
            schedule.force = false;
            self.states.insert(kind, SignalState::Hidden);
        }
        tracing::debug!(signal = %kind, enabled, "signal toggled");
    }

    /// Change a signal's cadence; the next tick evaluates against it.
    pub fn set_cadence(&mut self, kind: SignalKind, cadence: Duration) {
        if let Some(schedule) = self.schedules.get_mut(&kind) {
            schedule.cadence = cadence;
        }
    }

    /// Reconcile every signal with a new configuration.
    pub fn apply_config(&mut self, config: &SignalsConfig) {
        for kind in SignalKind::ALL {
            let signal = config.get(kind);
            self.set_enabled(kind, signal.enabled);
            self.set_cadence(kind, signal.cadence(kind));
            if let Some(schedule) = self.schedules.get_mut(&kind) {
                schedule.timeout = signal.timeout(kind);
            }
        }
    }

    /// Ignore the cadence gate on the next tick.
    pub fn force_refresh(&mut self, kind: SignalKind) {
        if let Some(schedule) = self.schedules.get_mut(&kind) {
            if schedule.enabled {
                schedule.force = true;
            }
        }
    }

    /// Cancel every in-flight fetch and stop scheduling.
    pub fn shutdown(&mut self) {
        self.shutdown.cancel();
        let now = Instant::now();
        for schedule in self.schedules.values_mut() {
            schedule.abandon(now);
        }
    }

    pub fn state(&self, kind: SignalKind) -> &SignalState {
        static HIDDEN: SignalState = SignalState::Hidden;
        self.states.get(&kind).unwrap_or(&HIDDEN)
    }

    pub fn states(&self) -> &BTreeMap<SignalKind, SignalState> {
        &self.states
    }

    pub fn schedule(&self, kind: SignalKind) -> Option<&SignalSchedule> {
        self.schedules.get(&kind)
    }

    pub fn in_flight_count(&self) -> usize {
        self.schedules.values().filter(|s| s.in_flight).count()
    }
}

fn spawn_fetch(
    kind: SignalKind,
    generation: u64,
    timeout: Duration,
    fetcher: SignalFetcherRef,
    cancel: CancellationToken,
    completions: CompletionSender,
) {
    tokio::spawn(async move {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = tokio::time::timeout(timeout, fetcher.fetch(cancel.clone())) => {
                result.unwrap_or(Err(FetchError::Timeout(timeout)))
            }
        };
        // Receiver gone means the loop has shut down.
        let _ = completions.send(FetchCompletion {
            kind,
            generation,
            outcome,
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{SignalFetcher, StaticFetcher};
    use crate::value::NetworkStatus;
    use crate::FetchResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl Counting {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SignalFetcher for Counting {
        async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(network_value())
        }
    }

    fn network_value() -> SignalValue {
        SignalValue::Network(NetworkStatus {
            rx_bytes_per_sec: 10.0,
            tx_bytes_per_sec: 5.0,
            latency_ms: Some(12.0),
        })
    }

    fn only(kind: SignalKind) -> SignalsConfig {
        let mut config = SignalsConfig::default();
        for other in SignalKind::ALL {
            config.get_mut(other).enabled = other == kind;
        }
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_fetches_and_completes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        orchestrator.register(
            SignalKind::Network,
            Arc::new(StaticFetcher::new(network_value())),
        );

        let now = Instant::now();
        assert_eq!(
            orchestrator.tick(now, ActivationMode::Collapsed),
            vec![SignalKind::Network]
        );
        assert_eq!(*orchestrator.state(SignalKind::Weather), SignalState::Hidden);

        let completion = rx.recv().await.unwrap();
        assert!(orchestrator.complete(Instant::now(), completion));
        assert!(orchestrator.state(SignalKind::Network).is_ready());
        assert!(!orchestrator.schedule(SignalKind::Network).unwrap().is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_due_tick_while_in_flight_is_noop() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        let fetcher = Counting::new(Duration::from_secs(3));
        orchestrator.register(SignalKind::Network, fetcher.clone());

        let start = Instant::now();
        orchestrator.tick(start, ActivationMode::Expanded);
        orchestrator.force_refresh(SignalKind::Network);
        // Forced and past cadence, but still outstanding.
        assert!(orchestrator
            .tick(start + Duration::from_secs(20), ActivationMode::Expanded)
            .is_empty());
        assert_eq!(orchestrator.in_flight_count(), 1);

        let completion = rx.recv().await.unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(orchestrator.complete(Instant::now(), completion));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_waits_for_cadence() {
        struct Failing;

        #[async_trait]
        impl SignalFetcher for Failing {
            async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
                Err(FetchError::failed("offline"))
            }
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        orchestrator.register(SignalKind::Network, Arc::new(Failing));

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        let completion = rx.recv().await.unwrap();
        let done = Instant::now();
        assert!(orchestrator.complete(done, completion));
        assert_eq!(
            *orchestrator.state(SignalKind::Network),
            SignalState::Unavailable
        );

        assert!(orchestrator
            .tick(done + Duration::from_secs(1), ActivationMode::Expanded)
            .is_empty());
        assert_eq!(
            orchestrator.tick(done + Duration::from_secs(8), ActivationMode::Expanded),
            vec![SignalKind::Network]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_completes_as_unavailable() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = only(SignalKind::Network);
        config.network.timeout_ms = Some(100);
        let mut orchestrator = RefreshOrchestrator::new(&config, tx);
        orchestrator.register(SignalKind::Network, Counting::new(Duration::from_secs(60)));

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        let completion = rx.recv().await.unwrap();
        assert!(matches!(completion.outcome, Err(FetchError::Timeout(_))));
        assert!(orchestrator.complete(Instant::now(), completion));
        assert_eq!(
            *orchestrator.state(SignalKind::Network),
            SignalState::Unavailable
        );
    }

    /// Bounds its own work; slower than the configured timeout.
    struct Budgeted {
        delay: Duration,
        budget: Duration,
    }

    #[async_trait]
    impl SignalFetcher for Budgeted {
        async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
            tokio::time::sleep(self.delay).await;
            Ok(network_value())
        }

        fn budget(&self) -> Option<Duration> {
            Some(self.budget)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetcher_budget_extends_timeout() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut config = only(SignalKind::Network);
        config.network.timeout_ms = Some(1000);
        let mut orchestrator = RefreshOrchestrator::new(&config, tx);
        orchestrator.register(
            SignalKind::Network,
            Arc::new(Budgeted {
                delay: Duration::from_secs(5),
                budget: Duration::from_secs(6),
            }),
        );

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        let completion = rx.recv().await.unwrap();
        assert!(completion.outcome.is_ok());
        assert!(orchestrator.complete(Instant::now(), completion));
        assert!(orchestrator.state(SignalKind::Network).is_ready());
    }

    #[test]
    fn test_effective_timeout() {
        let five = Duration::from_secs(5);
        assert_eq!(effective_timeout(five, None), five);
        assert_eq!(effective_timeout(five, Some(Duration::from_secs(1))), five);
        assert_eq!(
            effective_timeout(five, Some(Duration::from_secs(7))),
            Duration::from_secs(7) + BUDGET_GRACE
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_stamps_cancelled_fetch() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        orchestrator.register(SignalKind::Network, Counting::new(Duration::from_secs(30)));

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        tokio::time::advance(Duration::from_millis(300)).await;
        orchestrator.set_enabled(SignalKind::Network, false);

        let schedule = orchestrator.schedule(SignalKind::Network).unwrap();
        assert_eq!(schedule.last_fetch(), Some(Instant::now()));
        assert!(!schedule.is_in_flight());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_skipped_while_collapsed() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Stats), tx);
        orchestrator.register(SignalKind::Stats, Counting::new(Duration::ZERO));

        let now = Instant::now();
        assert!(orchestrator.tick(now, ActivationMode::Collapsed).is_empty());
        assert_eq!(
            orchestrator.tick(now, ActivationMode::Expanded),
            vec![SignalKind::Stats]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_fetcher_is_unavailable_without_spinning() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Media), tx);

        let now = Instant::now();
        assert!(orchestrator.tick(now, ActivationMode::Expanded).is_empty());
        assert_eq!(*orchestrator.state(SignalKind::Media), SignalState::Unavailable);
        let schedule = orchestrator.schedule(SignalKind::Media).unwrap();
        assert_eq!(schedule.last_fetch(), Some(now));
        assert!(!schedule.is_forced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_discards_late_completion() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        orchestrator.register(SignalKind::Network, Counting::new(Duration::from_secs(1)));

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        orchestrator.set_enabled(SignalKind::Network, false);
        assert_eq!(*orchestrator.state(SignalKind::Network), SignalState::Hidden);

        let completion = rx.recv().await.unwrap();
        assert!(matches!(completion.outcome, Err(FetchError::Cancelled)));
        assert!(!orchestrator.complete(Instant::now(), completion));
        assert_eq!(*orchestrator.state(SignalKind::Network), SignalState::Hidden);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_scheduling() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut orchestrator = RefreshOrchestrator::new(&only(SignalKind::Network), tx);
        orchestrator.register(SignalKind::Network, Counting::new(Duration::from_secs(30)));

        orchestrator.tick(Instant::now(), ActivationMode::Expanded);
        orchestrator.shutdown();
        assert_eq!(orchestrator.in_flight_count(), 0);

        let completion = rx.recv().await.unwrap();
        assert!(!orchestrator.complete(Instant::now(), completion));
        assert!(orchestrator
            .tick(Instant::now() + Duration::from_secs(60), ActivationMode::Expanded)
            .is_empty());
    }
}
