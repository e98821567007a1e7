//! Per-signal schedule row.

use crate::config::SignalConfig;
use crate::signal::SignalKind;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One row of the shared schedule table.
#[derive(Debug)]
pub struct SignalSchedule {
    pub(crate) cadence: Duration,
    pub(crate) timeout: Duration,
    pub(crate) last_fetch: Option<Instant>,
    pub(crate) enabled: bool,
    pub(crate) in_flight: bool,
    pub(crate) force: bool,
    pub(crate) generation: u64,
    pub(crate) cancel: Option<CancellationToken>,
}

impl SignalSchedule {
    pub fn new(kind: SignalKind, config: &SignalConfig) -> Self {
        Self {
            cadence: config.cadence(kind),
            timeout: config.timeout(kind),
            last_fetch: None,
            enabled: config.enabled,
            in_flight: false,
            // Cold start fetches immediately.
            force: config.enabled,
            generation: 0,
            cancel: None,
        }
    }

    pub fn cadence(&self) -> Duration {
        self.cadence
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the cadence gate (or force flag) lets a fetch start at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        if self.force {
            return true;
        }
        match self.last_fetch {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.cadence,
        }
    }

    /// When the cadence gate next opens, if it is closed.
    pub fn next_due(&self) -> Option<Instant> {
        if self.force {
            return None;
        }
        self.last_fetch.map(|last| last + self.cadence)
    }

    /// Cancel any outstanding attempt and invalidate its completion. A
    /// cancelled attempt counts as a fetch at `now`.
    pub(crate) fn abandon(&mut self, now: Instant) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        if self.in_flight {
            self.generation += 1;
            self.last_fetch = Some(now);
        }
        self.in_flight = false;
    }
}
