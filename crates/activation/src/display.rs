//! Display resolution and pointer sampling.
//!
//! The screen provider abstracts the platform so the machine can be driven
//! from tests or any windowing backend.

use crate::error::ActivationError;
use crate::geometry::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Stable display identity as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayId(pub u32);

impl std::fmt::Display for DisplayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "display-{}", self.0)
    }
}

/// A connected display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: DisplayId,

    /// Frame in global coordinates.
    pub frame: Rect,

    /// Physical notch / camera housing, if the display has one.
    #[serde(default)]
    pub notch: Option<Rect>,

    /// Whether this is the primary display.
    #[serde(default)]
    pub is_main: bool,
}

impl DisplayInfo {
    pub fn new(id: u32, frame: Rect) -> Self {
        Self {
            id: DisplayId(id),
            frame,
            notch: None,
            is_main: false,
        }
    }

    pub fn with_notch(mut self, notch: Rect) -> Self {
        self.notch = Some(notch);
        self
    }

    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }
}

/// Pointer position plus mouse button state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerSample {
    pub position: Point,

    /// Any mouse button currently held (drag in progress).
    pub buttons_down: bool,
}

impl PointerSample {
    pub const fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            buttons_down: false,
        }
    }

    pub const fn dragging(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            buttons_down: true,
        }
    }
}

/// Source of pointer and display state.
pub trait ScreenProvider: Send + Sync {
    /// Current pointer position and button state.
    fn pointer(&self) -> PointerSample;

    /// Currently connected displays.
    fn displays(&self) -> Vec<DisplayInfo>;
}

/// Provider with no displays. The machine stays idle against it.
pub struct NullScreenProvider;

impl ScreenProvider for NullScreenProvider {
    fn pointer(&self) -> PointerSample {
        PointerSample::default()
    }

    fn displays(&self) -> Vec<DisplayInfo> {
        Vec::new()
    }
}

/// Pick the display that hosts the activation zone.
///
/// Resolution order:
/// 1. The preferred display, matched by stable id
/// 2. The first display reporting a notch
/// 3. The main display
/// 4. The first listed display
///
/// Frame containment of the pointer is never used here: mirrored or
/// overlapping displays share coordinates.
pub fn resolve_target_display(
    displays: &[DisplayInfo],
    preferred: Option<DisplayId>,
) -> Result<&DisplayInfo, ActivationError> {
    if let Some(id) = preferred {
        if let Some(display) = displays.iter().find(|d| d.id == id) {
            return Ok(display);
        }
    }

    displays
        .iter()
        .find(|d| d.notch.is_some())
        .or_else(|| displays.iter().find(|d| d.is_main))
        .or_else(|| displays.first())
        .ok_or(ActivationError::NoTargetDisplay)
}
