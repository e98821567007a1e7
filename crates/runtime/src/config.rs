//! Aggregate panel configuration and its live store.

use crate::countdown::CountdownConfig;
use crate::error::Result;
use perch_activation::ActivationConfig;
use perch_refresh::SignalsConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub activation: ActivationConfig,
    pub signals: SignalsConfig,
    pub countdown: CountdownConfig,
    /// Keep a minimal indicator on screen while media is playing.
    pub media_live_indicator: bool,
}

impl PanelConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// Read/observe access to the live configuration.
///
/// Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    tx: watch::Sender<PanelConfig>,
}

impl ConfigStore {
    pub fn new(config: PanelConfig) -> Self {
        let (tx, _rx) = watch::channel(config);
        Self { tx }
    }

    /// Current configuration.
    pub fn get(&self) -> PanelConfig {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelConfig> {
        self.tx.subscribe()
    }

    /// Replace the configuration. Observers are only woken on a real change.
    pub fn replace(&self, config: PanelConfig) {
        self.tx.send_if_modified(|current| {
            if *current == config {
                return false;
            }
            *current = config;
            true
        });
    }

    /// Edit the configuration in place.
    pub fn update(&self, edit: impl FnOnce(&mut PanelConfig)) {
        let mut next = self.get();
        edit(&mut next);
        self.replace(next);
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}
