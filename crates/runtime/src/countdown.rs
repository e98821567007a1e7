//! Countdown live widget.
//!
//! The deadline is derived from the start instant and the current duration,
//! so changing the duration moves a running countdown's deadline at once.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Default countdown length (5 minutes).
pub const DEFAULT_COUNTDOWN_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    pub duration_secs: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_COUNTDOWN_SECS,
        }
    }
}

impl CountdownConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    started_at: Option<Instant>,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started_at: None,
        }
    }

    /// Start (or restart) from `now`.
    pub fn start(&mut self, now: Instant) {
        self.started_at = Some(now);
        tracing::info!(duration_secs = self.duration.as_secs(), "countdown started");
    }

    pub fn cancel(&mut self) {
        if self.started_at.take().is_some() {
            tracing::info!("countdown cancelled");
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Change the length. A running countdown picks it up immediately.
    pub fn set_duration(&mut self, duration: Duration) {
        if self.duration != duration {
            tracing::debug!(duration_secs = duration.as_secs(), running = self.started_at.is_some(), "countdown duration changed");
        }
        self.duration = duration;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.started_at.map(|start| start + self.duration)
    }

    pub fn is_active(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now < deadline)
    }

    /// Time left while running.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Clear the countdown if it has run out. Returns true exactly once per
    /// expiry.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.started_at = None;
                tracing::info!("countdown finished");
                true
            }
            _ => false,
        }
    }
}
