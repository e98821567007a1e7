//! The decision loop.
//!
//! One tokio task owns the activation machine, the refresh orchestrator, the
//! countdown and the artwork tracker. Everything else talks to it through
//! channels: fetch tasks report completions, the handle sends control
//! messages, the config store pushes changes. Consumers read the published
//! [`PanelSnapshot`] and never the working state.

use crate::config::{ConfigStore, PanelConfig};
use crate::countdown::Countdown;
use crate::error::{Result, RuntimeError};
use crate::media::MediaFetcher;
use crate::snapshot::PanelSnapshot;
use perch_activation::{
    resolve_target_display, ActivationMachine, ActivationMode, DisplayInfo, PanelCommand,
    PanelControllerRef, PointerSample, ScreenProvider,
};
use perch_arbiter::{
    ArtworkAction, ArtworkResolverRef, ArtworkTracker, MediaIdentity, MediaSnapshot, SourceArbiter,
};
use perch_events::{
    emit_event, event_names, timestamp_ms, EventBusRef, MediaChangedEvent, ModeChangedEvent,
    NullEventBus, SignalUpdatedEvent,
};
use perch_refresh::{
    FetchCompletion, RefreshOrchestrator, SignalFetcherRef, SignalKind, SignalState,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Requests from the handle to the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlMessage {
    StartCountdown,
    CancelCountdown,
    ForceRefresh(SignalKind),
}

type ArtworkResult = (MediaIdentity, Option<String>);

/// Assembles a panel runtime.
pub struct PanelRuntimeBuilder {
    screen: Arc<dyn ScreenProvider>,
    controller: PanelControllerRef,
    bus: EventBusRef,
    config: ConfigStore,
    fetchers: Vec<(SignalKind, SignalFetcherRef)>,
    artwork: Option<ArtworkResolverRef>,
    initial_mode: ActivationMode,
}

impl PanelRuntimeBuilder {
    pub fn new(screen: Arc<dyn ScreenProvider>, controller: PanelControllerRef) -> Self {
        Self {
            screen,
            controller,
            bus: Arc::new(NullEventBus),
            config: ConfigStore::default(),
            fetchers: Vec::new(),
            artwork: None,
            initial_mode: ActivationMode::Collapsed,
        }
    }

    pub fn with_config(self, config: PanelConfig) -> Self {
        self.with_config_store(ConfigStore::new(config))
    }

    pub fn with_config_store(mut self, config: ConfigStore) -> Self {
        self.config = config;
        self
    }

    pub fn with_event_bus(mut self, bus: EventBusRef) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_fetcher(mut self, kind: SignalKind, fetcher: SignalFetcherRef) -> Self {
        self.fetchers.push((kind, fetcher));
        self
    }

    /// Use `arbiter` as the media signal's fetcher.
    pub fn with_media(self, arbiter: SourceArbiter) -> Self {
        self.with_fetcher(
            SignalKind::Media,
            Arc::new(MediaFetcher::new(Arc::new(arbiter))),
        )
    }

    pub fn with_artwork_resolver(mut self, resolver: ArtworkResolverRef) -> Self {
        self.artwork = Some(resolver);
        self
    }

    pub fn with_initial_mode(mut self, mode: ActivationMode) -> Self {
        self.initial_mode = mode;
        self
    }

    /// Start the decision loop on the current tokio runtime.
    pub fn spawn(self) -> RuntimeHandle {
        let config = self.config.get();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (artwork_tx, artwork_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) =
            watch::channel(Arc::new(PanelSnapshot::initial(self.initial_mode)));
        let cancel = CancellationToken::new();

        let mut orchestrator = RefreshOrchestrator::new(&config.signals, completions_tx);
        for (kind, fetcher) in self.fetchers {
            orchestrator.register(kind, fetcher);
        }

        let panel = PanelLoop {
            machine: ActivationMachine::new(config.activation.clone(), self.initial_mode),
            orchestrator,
            countdown: Countdown::new(config.countdown.duration()),
            artwork: ArtworkTracker::new(),
            resolver: self.artwork,
            media: None,
            media_live_indicator: config.media_live_indicator,
            config,
            screen: self.screen,
            controller: self.controller,
            bus: self.bus,
            snapshot_tx,
            published_signals: BTreeMap::new(),
            artwork_tx,
            display_missing: false,
        };

        let channels = LoopChannels {
            config: self.config.subscribe(),
            control: control_rx,
            completions: completions_rx,
            artwork: artwork_rx,
            cancel: cancel.clone(),
        };

        let task = tokio::spawn(panel.run(channels));

        RuntimeHandle {
            control: control_tx,
            snapshots: snapshot_rx,
            config: self.config,
            cancel,
            task: Some(task),
        }
    }
}

/// Handle to a running panel. Dropping it stops the loop.
pub struct RuntimeHandle {
    control: mpsc::UnboundedSender<ControlMessage>,
    snapshots: watch::Receiver<Arc<PanelSnapshot>>,
    config: ConfigStore,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl RuntimeHandle {
    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<PanelSnapshot> {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<PanelSnapshot>> {
        self.snapshots.clone()
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn send(&self, message: ControlMessage) -> Result<()> {
        self.control
            .send(message)
            .map_err(|_| RuntimeError::Shutdown)
    }

    pub fn start_countdown(&self) -> Result<()> {
        self.send(ControlMessage::StartCountdown)
    }

    pub fn cancel_countdown(&self) -> Result<()> {
        self.send(ControlMessage::CancelCountdown)
    }

    pub fn force_refresh(&self, kind: SignalKind) -> Result<()> {
        self.send(ControlMessage::ForceRefresh(kind))
    }

    /// Stop the loop, cancel in-flight fetches and wait for it to finish.
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task.await.map_err(|e| {
                tracing::error!(error = %e, "panel loop ended abnormally");
                RuntimeError::Shutdown
            }),
            None => Ok(()),
        }
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct LoopChannels {
    config: watch::Receiver<PanelConfig>,
    control: mpsc::UnboundedReceiver<ControlMessage>,
    completions: mpsc::UnboundedReceiver<FetchCompletion>,
    artwork: mpsc::UnboundedReceiver<ArtworkResult>,
    cancel: CancellationToken,
}

struct PanelLoop {
    machine: ActivationMachine,
    orchestrator: RefreshOrchestrator,
    countdown: Countdown,
    artwork: ArtworkTracker,
    resolver: Option<ArtworkResolverRef>,
    media: Option<MediaSnapshot>,
    media_live_indicator: bool,
    config: PanelConfig,
    screen: Arc<dyn ScreenProvider>,
    controller: PanelControllerRef,
    bus: EventBusRef,
    snapshot_tx: watch::Sender<Arc<PanelSnapshot>>,
    published_signals: BTreeMap<SignalKind, SignalState>,
    artwork_tx: mpsc::UnboundedSender<ArtworkResult>,
    display_missing: bool,
}

impl PanelLoop {
    async fn run(mut self, mut channels: LoopChannels) {
        tracing::info!(mode = %self.machine.mode(), "panel loop started");

        // Establishes window state; not a transition.
        for command in self.machine.initial_commands() {
            self.controller.apply(&command);
        }

        let mut ticker = sampling_ticker(self.config.activation.sample_interval());
        let mut config_open = true;

        loop {
            let deadline = self.next_deadline();
            let timer = async move {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                _ = channels.cancel.cancelled() => break,
                changed = channels.config.changed(), if config_open => {
                    match changed {
                        Ok(()) => {
                            let config = channels.config.borrow_and_update().clone();
                            self.apply_config(config, &mut ticker);
                        }
                        Err(_) => config_open = false,
                    }
                }
                Some(message) = channels.control.recv() => self.handle_control(message),
                Some(completion) = channels.completions.recv() => self.handle_completion(completion),
                Some((identity, artwork)) = channels.artwork.recv() => self.handle_artwork(identity, artwork),
                _ = timer => self.on_deadline(),
                _ = ticker.tick() => self.on_tick(),
            }

            self.publish();
        }

        self.orchestrator.shutdown();
        self.artwork.observe(None);
        tracing::info!("panel loop stopped");
    }

    fn next_deadline(&self) -> Option<Instant> {
        // Without a display the machine cannot fire its timers; the sampling
        // tick notices when one comes back.
        let machine = if self.display_missing {
            None
        } else {
            self.machine.next_deadline()
        };
        match (machine, self.countdown.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Pointer and target display, logging transitions into and out of the
    /// no-display condition once each.
    fn observe_screen(&mut self) -> (PointerSample, Option<DisplayInfo>) {
        let pointer = self.screen.pointer();
        let displays = self.screen.displays();
        let display = match resolve_target_display(&displays, self.config.activation.preferred_display) {
            Ok(target) => {
                if self.display_missing {
                    tracing::info!(display = %target.id, "target display available");
                    self.display_missing = false;
                }
                Some(target.clone())
            }
            Err(e) => {
                if !self.display_missing {
                    tracing::warn!(error = %e, "activation suspended");
                    self.display_missing = true;
                }
                None
            }
        };
        (pointer, display)
    }

    fn on_tick(&mut self) {
        let now = Instant::now();
        let (pointer, display) = self.observe_screen();
        let commands = self.machine.sample(now, pointer, display.as_ref());
        self.apply_commands(&commands);

        self.poll_countdown(now);
        self.orchestrator.tick(now, self.machine.mode());
    }

    fn on_deadline(&mut self) {
        let now = Instant::now();
        let (pointer, display) = self.observe_screen();
        let commands = self.machine.poll_timers(now, pointer, display.as_ref());
        self.apply_commands(&commands);
        self.poll_countdown(now);
    }

    fn poll_countdown(&mut self, now: Instant) {
        if self.countdown.poll(now) {
            self.refresh_live_widget();
        }
    }

    fn handle_control(&mut self, message: ControlMessage) {
        let now = Instant::now();
        match message {
            ControlMessage::StartCountdown => {
                self.countdown.start(now);
                self.refresh_live_widget();
            }
            ControlMessage::CancelCountdown => {
                self.countdown.cancel();
                self.refresh_live_widget();
            }
            ControlMessage::ForceRefresh(kind) => {
                self.orchestrator.force_refresh(kind);
                self.orchestrator.tick(now, self.machine.mode());
            }
        }
    }

    fn handle_completion(&mut self, completion: FetchCompletion) {
        let kind = completion.kind;
        if !self.orchestrator.complete(Instant::now(), completion) {
            return;
        }
        if kind == SignalKind::Media {
            let media = self
                .orchestrator
                .state(SignalKind::Media)
                .value()
                .and_then(|value| value.as_media())
                .cloned();
            self.set_media(media);
        }
    }

    fn handle_artwork(&mut self, identity: MediaIdentity, artwork: Option<String>) {
        if self.artwork.complete(&identity, artwork) {
            self.emit_media_changed();
        }
    }

    fn apply_config(&mut self, config: PanelConfig, ticker: &mut Interval) {
        let now = Instant::now();
        tracing::info!("configuration changed");

        if config.activation.sample_interval() != self.config.activation.sample_interval() {
            *ticker = sampling_ticker(config.activation.sample_interval());
        }
        self.machine.set_config(config.activation.clone());
        self.orchestrator.apply_config(&config.signals);
        self.countdown.set_duration(config.countdown.duration());
        self.media_live_indicator = config.media_live_indicator;
        self.config = config;

        if !self.config.signals.media.enabled && self.media.is_some() {
            self.set_media(None);
        }

        // A shorter countdown may already be over.
        self.poll_countdown(now);
        self.refresh_live_widget();
        self.orchestrator.tick(now, self.machine.mode());
    }

    fn set_media(&mut self, media: Option<MediaSnapshot>) {
        let changed = match (&self.media, &media) {
            (Some(old), Some(new)) => old.identity() != new.identity() || old.is_playing != new.is_playing,
            (None, None) => false,
            _ => true,
        };

        match self.artwork.observe(media.as_ref()) {
            ArtworkAction::Fetch { identity, cancel } => {
                if let (Some(resolver), Some(snapshot)) = (&self.resolver, &media) {
                    spawn_artwork(resolver.clone(), snapshot.clone(), identity, cancel, self.artwork_tx.clone());
                }
            }
            ArtworkAction::Keep | ArtworkAction::Cleared => {}
        }

        self.media = media;
        if changed {
            self.emit_media_changed();
            self.refresh_live_widget();
        }
    }

    fn live_widget_wanted(&self) -> bool {
        let now = Instant::now();
        let media_playing = self.media.as_ref().is_some_and(|m| m.is_playing);
        self.countdown.is_active(now) || (self.media_live_indicator && media_playing)
    }

    fn refresh_live_widget(&mut self) {
        let commands = self.machine.set_live_widget(self.live_widget_wanted());
        self.apply_commands(&commands);
    }

    fn apply_commands(&self, commands: &[PanelCommand]) {
        if commands.is_empty() {
            return;
        }
        let mut mode_change = None;
        for command in commands {
            if let PanelCommand::SetMode { mode, .. } = command {
                mode_change = Some(*mode);
            }
            self.controller.apply(command);
        }

        if let Some(mode) = mode_change {
            let previous = match mode {
                ActivationMode::Expanded => ActivationMode::Collapsed,
                ActivationMode::Collapsed => ActivationMode::Expanded,
            };
            emit_event(
                self.bus.as_ref(),
                event_names::MODE_CHANGED,
                &ModeChangedEvent {
                    mode,
                    previous,
                    presence: self.machine.presence(),
                    live_widget: self.machine.is_live_widget(),
                    timestamp_ms: timestamp_ms(),
                },
            );
        }
    }

    fn emit_media_changed(&self) {
        let artwork = self.current_artwork();
        emit_event(
            self.bus.as_ref(),
            event_names::MEDIA_CHANGED,
            &MediaChangedEvent {
                media: self.media.clone(),
                artwork,
                timestamp_ms: timestamp_ms(),
            },
        );
    }

    fn current_artwork(&self) -> Option<String> {
        let media = self.media.as_ref()?;
        self.artwork
            .artwork_for(&media.identity())
            .map(str::to_string)
    }

    /// Emit signal events for changed states and publish a new snapshot if
    /// anything visible changed.
    fn publish(&mut self) {
        for (kind, state) in self.orchestrator.states() {
            // Media has its own event keyed on identity.
            if *kind == SignalKind::Media {
                continue;
            }
            if self.published_signals.get(kind) != Some(state) {
                emit_event(
                    self.bus.as_ref(),
                    event_names::SIGNAL_UPDATED,
                    &SignalUpdatedEvent {
                        signal: *kind,
                        state: state.clone(),
                        timestamp_ms: timestamp_ms(),
                    },
                );
                self.published_signals.insert(*kind, state.clone());
            }
        }

        let now = Instant::now();
        let candidate = PanelSnapshot {
            sequence: 0,
            mode: self.machine.mode(),
            presence: self.machine.presence(),
            live_widget: self.machine.is_live_widget(),
            media: self.media.clone(),
            artwork: self.current_artwork(),
            signals: self.orchestrator.states().clone(),
            countdown_remaining_secs: self
                .countdown
                .remaining(now)
                .map(ceil_secs),
        };

        self.snapshot_tx.send_if_modified(|current| {
            if current.same_content(&candidate) {
                return false;
            }
            let mut next = candidate;
            next.sequence = current.sequence + 1;
            *current = Arc::new(next);
            true
        });
    }
}

fn sampling_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

fn ceil_secs(duration: Duration) -> u64 {
    let secs = duration.as_secs();
    if duration.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

fn spawn_artwork(
    resolver: ArtworkResolverRef,
    snapshot: MediaSnapshot,
    identity: MediaIdentity,
    cancel: CancellationToken,
    results: mpsc::UnboundedSender<ArtworkResult>,
) {
    tokio::spawn(async move {
        let artwork = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            artwork = resolver.resolve(&snapshot, &cancel) => artwork,
        };
        let _ = results.send((identity, artwork));
    });
}
