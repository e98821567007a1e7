//! Signal values and displayed state.

use crate::signal::SignalKind;
use perch_arbiter::MediaSnapshot;
use serde::{Deserialize, Serialize};

/// Current conditions from a weather source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub condition: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// One upcoming calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEntry {
    pub title: String,
    /// Start time in milliseconds since epoch.
    pub starts_at_ms: i64,
    #[serde(default)]
    pub ends_at_ms: Option<i64>,
    #[serde(default)]
    pub calendar: Option<String>,
}

/// Throughput since the previous sample plus optional round-trip latency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub rx_bytes_per_sec: f64,
    pub tx_bytes_per_sec: f64,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

/// Local machine load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu_percent: f32,
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    #[serde(default)]
    pub gpu_percent: Option<f32>,
    #[serde(default)]
    pub battery_percent: Option<f32>,
}

impl SystemStats {
    pub fn memory_percent(&self) -> f32 {
        if self.memory_total_bytes == 0 {
            return 0.0;
        }
        (self.memory_used_bytes as f64 / self.memory_total_bytes as f64 * 100.0) as f32
    }
}

/// A fetched value, typed per signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SignalValue {
    /// `None` when nothing is loaded anywhere.
    Media(Option<MediaSnapshot>),
    Weather(WeatherReport),
    Calendar(Vec<CalendarEntry>),
    Network(NetworkStatus),
    Stats(SystemStats),
}

impl SignalValue {
    pub fn kind(&self) -> SignalKind {
        match self {
            SignalValue::Media(_) => SignalKind::Media,
            SignalValue::Weather(_) => SignalKind::Weather,
            SignalValue::Calendar(_) => SignalKind::Calendar,
            SignalValue::Network(_) => SignalKind::Network,
            SignalValue::Stats(_) => SignalKind::Stats,
        }
    }

    pub fn as_media(&self) -> Option<&MediaSnapshot> {
        match self {
            SignalValue::Media(snapshot) => snapshot.as_ref(),
            _ => None,
        }
    }
}

/// What the panel shows for a signal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "lowercase")]
pub enum SignalState {
    /// Disabled; nothing is shown.
    #[default]
    Hidden,
    /// Enabled but no value this cycle.
    Unavailable,
    Ready(SignalValue),
}

impl SignalState {
    pub fn value(&self) -> Option<&SignalValue> {
        match self {
            SignalState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SignalState::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_percent() {
        let stats = SystemStats {
            cpu_percent: 10.0,
            memory_used_bytes: 4,
            memory_total_bytes: 16,
            gpu_percent: None,
            battery_percent: None,
        };
        assert_eq!(stats.memory_percent(), 25.0);

        let empty = SystemStats {
            memory_total_bytes: 0,
            ..stats
        };
        assert_eq!(empty.memory_percent(), 0.0);
    }

    #[test]
    fn test_state_json_shape() {
        let state = SignalState::Ready(SignalValue::Network(NetworkStatus {
            rx_bytes_per_sec: 1.0,
            tx_bytes_per_sec: 2.0,
            latency_ms: None,
        }));
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["state"], "ready");
        assert_eq!(json["value"]["kind"], "network");

        let hidden = serde_json::to_value(SignalState::Hidden).unwrap();
        assert_eq!(hidden["state"], "hidden");
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(SignalValue::Media(None).kind(), SignalKind::Media);
        assert!(SignalValue::Media(None).as_media().is_none());
        assert_eq!(SignalValue::Calendar(vec![]).kind(), SignalKind::Calendar);
    }
}
