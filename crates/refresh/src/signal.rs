//! Tracked signal kinds and their default cadences.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A periodically refreshed signal shown by the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Media,
    Weather,
    Calendar,
    Network,
    Stats,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Media,
        SignalKind::Weather,
        SignalKind::Calendar,
        SignalKind::Network,
        SignalKind::Stats,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SignalKind::Media => "media",
            SignalKind::Weather => "weather",
            SignalKind::Calendar => "calendar",
            SignalKind::Network => "network",
            SignalKind::Stats => "stats",
        }
    }

    pub fn default_cadence(&self) -> Duration {
        match self {
            SignalKind::Media => Duration::from_millis(2500),
            SignalKind::Weather => Duration::from_secs(600),
            SignalKind::Calendar => Duration::from_secs(300),
            SignalKind::Network => Duration::from_secs(8),
            SignalKind::Stats => Duration::from_secs(2),
        }
    }

    pub fn default_timeout(&self) -> Duration {
        match self {
            SignalKind::Media => Duration::from_secs(5),
            SignalKind::Weather => Duration::from_secs(15),
            SignalKind::Calendar => Duration::from_secs(10),
            SignalKind::Network => Duration::from_secs(5),
            SignalKind::Stats => Duration::from_secs(2),
        }
    }

    /// Cheap local signals are not worth sampling while nobody can see them.
    pub fn runs_while_collapsed(&self) -> bool {
        !matches!(self, SignalKind::Stats)
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
