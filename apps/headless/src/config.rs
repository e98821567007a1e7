//! Host configuration file.

use perch_activation::Rect;
use perch_arbiter::CommandSpec;
use perch_runtime::{PanelConfig, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The simulated display the host reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub id: u32,
    pub frame: Rect,
    pub notch: Option<Rect>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            id: 1,
            frame: Rect::new(0.0, 0.0, 1440.0, 900.0),
            notch: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadlessConfig {
    pub panel: PanelConfig,
    pub display: DisplayConfig,
    /// Media sources in priority order.
    pub media_sources: Vec<CommandSpec>,
    /// Last-resort media source.
    pub fallback_media: Option<CommandSpec>,
    /// Prints a weather report as JSON.
    pub weather_command: Option<CommandSpec>,
    /// Prints calendar entries as a JSON array.
    pub calendar_command: Option<CommandSpec>,
    /// `host:port` timed by the network signal; no probe when absent.
    pub probe_addr: Option<String>,
}

impl HeadlessConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&raw)?)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example() {
        let config: HeadlessConfig = serde_json::from_str(
            r#"{
                "panel": {"media_live_indicator": true},
                "display": {"id": 3, "notch": {"origin": {"x": 620, "y": 0}, "size": {"width": 200, "height": 32}}},
                "media_sources": [
                    {"name": "Music", "program": "now-playing", "args": ["--music"]}
                ],
                "probe_addr": "1.1.1.1:443"
            }"#,
        )
        .unwrap();
        assert!(config.panel.media_live_indicator);
        assert_eq!(config.display.id, 3);
        assert!(config.display.notch.is_some());
        assert_eq!(config.media_sources[0].args, vec!["--music"]);
        assert!(config.weather_command.is_none());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = HeadlessConfig::load(Some(Path::new("/definitely/not/here.json"))).unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
