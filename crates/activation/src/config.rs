//! Activation timing and geometry configuration.

use crate::display::DisplayId;
use crate::geometry::Size;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default pointer sampling interval (80ms).
pub const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 80;

/// Default delay before a pending collapse fires (200ms).
pub const DEFAULT_COLLAPSE_DELAY_MS: u64 = 200;

/// Default exit animation length before the panel is hidden (300ms).
pub const DEFAULT_COLLAPSE_ANIMATION_MS: u64 = 300;

/// Default tolerance around the panel bounds, in points.
pub const DEFAULT_HOVER_MARGIN: f64 = 10.0;

/// Configuration for the activation machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Pointer sampling interval in milliseconds.
    pub sample_interval_ms: u64,

    /// Delay before a pending collapse fires, in milliseconds.
    pub collapse_delay_ms: u64,

    /// Exit animation length in milliseconds; the hide is deferred by this much.
    pub collapse_animation_ms: u64,

    /// Extra margin around the panel bounds that still counts as hovering.
    pub hover_margin: f64,

    /// Activation zone size, used when the display reports no notch.
    pub zone_size: Size,

    /// Panel size while expanded.
    pub expanded_size: Size,

    /// Panel size while collapsed (during the exit animation).
    pub collapsed_size: Size,

    /// Size of the minimal live indicator.
    pub minimal_size: Size,

    /// Display to host the panel, by stable id.
    pub preferred_display: Option<DisplayId>,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: DEFAULT_SAMPLE_INTERVAL_MS,
            collapse_delay_ms: DEFAULT_COLLAPSE_DELAY_MS,
            collapse_animation_ms: DEFAULT_COLLAPSE_ANIMATION_MS,
            hover_margin: DEFAULT_HOVER_MARGIN,
            zone_size: Size::new(200.0, 32.0),
            expanded_size: Size::new(480.0, 180.0),
            collapsed_size: Size::new(200.0, 32.0),
            minimal_size: Size::new(280.0, 32.0),
            preferred_display: None,
        }
    }
}

impl ActivationConfig {
    pub fn sample_interval(&self) -> Duration {
        // A zero interval would spin the decision loop.
        Duration::from_millis(self.sample_interval_ms.max(1))
    }

    pub fn collapse_delay(&self) -> Duration {
        Duration::from_millis(self.collapse_delay_ms)
    }

    pub fn collapse_animation(&self) -> Duration {
        Duration::from_millis(self.collapse_animation_ms)
    }
}
