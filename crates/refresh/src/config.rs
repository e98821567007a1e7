//! Per-signal enable gates and cadences.

use crate::signal::SignalKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for one signal.
///
/// A section present in JSON is enabled unless it says otherwise. Cadence and
/// timeout fall back to the signal's defaults when absent or invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalConfig {
    pub enabled: bool,
    pub cadence_secs: Option<f64>,
    pub timeout_ms: Option<u64>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cadence_secs: None,
            timeout_ms: None,
        }
    }
}

impl SignalConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn cadence(&self, kind: SignalKind) -> Duration {
        self.cadence_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or_else(|| kind.default_cadence())
    }

    pub fn timeout(&self, kind: SignalKind) -> Duration {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or_else(|| kind.default_timeout())
    }
}

/// Configuration for all tracked signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalsConfig {
    pub media: SignalConfig,
    pub weather: SignalConfig,
    pub calendar: SignalConfig,
    pub network: SignalConfig,
    pub stats: SignalConfig,
}

impl Default for SignalsConfig {
    fn default() -> Self {
        Self {
            media: SignalConfig::default(),
            // Need user-supplied sources.
            weather: SignalConfig::disabled(),
            calendar: SignalConfig::disabled(),
            network: SignalConfig::default(),
            stats: SignalConfig::default(),
        }
    }
}

impl SignalsConfig {
    pub fn get(&self, kind: SignalKind) -> &SignalConfig {
        match kind {
            SignalKind::Media => &self.media,
            SignalKind::Weather => &self.weather,
            SignalKind::Calendar => &self.calendar,
            SignalKind::Network => &self.network,
            SignalKind::Stats => &self.stats,
        }
    }

    pub fn get_mut(&mut self, kind: SignalKind) -> &mut SignalConfig {
        match kind {
            SignalKind::Media => &mut self.media,
            SignalKind::Weather => &mut self.weather,
            SignalKind::Calendar => &mut self.calendar,
            SignalKind::Network => &mut self.network,
            SignalKind::Stats => &mut self.stats,
        }
    }
}
