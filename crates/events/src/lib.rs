//! Shared event contracts for the perch panel.
//!
//! This crate defines the DTOs published by the decision loop. Using shared
//! types keeps producers and consumers (desktop shell, headless host, tests)
//! agreeing on field names.
//!
//! Also provides the `EventBus` trait for decoupled event emission.

mod bus;

pub use bus::{
    emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus,
    TracingEventBus,
};

use perch_activation::{ActivationMode, Presence};
use perch_arbiter::MediaSnapshot;
use perch_refresh::{SignalKind, SignalState};
use serde::{Deserialize, Serialize};

/// Event emitted when the panel expands or collapses.
///
/// Producers: runtime decision loop
/// Consumers: panel frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeChangedEvent {
    pub mode: ActivationMode,
    pub previous: ActivationMode,
    pub presence: Presence,
    /// Whether a live widget keeps a minimal indicator on screen.
    #[serde(default)]
    pub live_widget: bool,
    /// Timestamp in milliseconds.
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Event emitted when the arbitrated now-playing media or its artwork changes.
///
/// Producers: runtime decision loop
/// Consumers: panel frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaChangedEvent {
    /// `None` when nothing is playing or paused anywhere.
    #[serde(default)]
    pub media: Option<MediaSnapshot>,
    #[serde(default)]
    pub artwork: Option<String>,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Event emitted when a signal's displayed state changes.
///
/// Producers: runtime decision loop
/// Consumers: panel frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalUpdatedEvent {
    pub signal: SignalKind,
    pub state: SignalState,
    #[serde(default)]
    pub timestamp_ms: i64,
}

/// Wall-clock timestamp for event payloads, in milliseconds since epoch.
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// Panel expanded or collapsed.
    pub const MODE_CHANGED: &str = "panel:mode_changed";
    /// Now-playing media changed.
    pub const MEDIA_CHANGED: &str = "panel:media_changed";
    /// A signal's state changed.
    pub const SIGNAL_UPDATED: &str = "panel:signal_updated";
}
