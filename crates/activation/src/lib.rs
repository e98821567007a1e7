//! Hover activation for the perch panel.
//!
//! Decides when the panel expands and collapses from pointer samples and
//! drag state, and tells a [`PanelController`] what to do about it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  geometry.rs   - Point / Size / Rect (pure)                 │
//! │  machine.rs    - ActivationMachine, PendingCollapse (pure)  │
//! │  config.rs     - ActivationConfig                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Boundary Layer                           │
//! │  display.rs    - ScreenProvider, target display resolution  │
//! │  controller.rs - PanelController, PanelCommand              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use perch_activation::{ActivationConfig, ActivationMachine, ActivationMode};
//!
//! let mut machine = ActivationMachine::new(ActivationConfig::default(), ActivationMode::Collapsed);
//! let display = resolve_target_display(&screen.displays(), None).ok();
//! for command in machine.sample(Instant::now(), screen.pointer(), display) {
//!     controller.apply(&command);
//! }
//! ```

mod config;
mod controller;
mod display;
mod error;
mod geometry;
mod machine;

pub use config::{
    ActivationConfig, DEFAULT_COLLAPSE_ANIMATION_MS, DEFAULT_COLLAPSE_DELAY_MS,
    DEFAULT_HOVER_MARGIN, DEFAULT_SAMPLE_INTERVAL_MS,
};
pub use controller::{
    InMemoryPanelController, NullPanelController, PanelCommand, PanelController,
    PanelControllerRef,
};
pub use display::{
    resolve_target_display, DisplayId, DisplayInfo, NullScreenProvider, PointerSample,
    ScreenProvider,
};
pub use error::ActivationError;
pub use geometry::{Point, Rect, Size};
pub use machine::{ActivationMachine, ActivationMode, PendingCollapse, Presence};
