//! Runtime core of the perch panel.
//!
//! Wires the activation machine, the refresh orchestrator and the media
//! arbiter into a single decision loop and publishes an immutable
//! [`PanelSnapshot`] after every change.
//!
//! # Architecture
//!
//! ```text
//!  ScreenProvider ──pointer/displays──┐
//!                                      ▼
//!  ConfigStore ──watch──▶  ┌──────────────────────┐ ──PanelCommand──▶ PanelController
//!  RuntimeHandle ──mpsc──▶ │     decision loop     │
//!  fetch tasks ──mpsc────▶ │ machine, orchestrator │ ──events──────▶ EventBus
//!  artwork tasks ──mpsc──▶ │ countdown, artwork    │
//!                          └──────────────────────┘ ──watch─────────▶ PanelSnapshot
//! ```
//!
//! # Example
//!
//! ```ignore
//! use perch_runtime::{init_tracing, PanelConfig, PanelRuntimeBuilder};
//!
//! init_tracing();
//! let handle = PanelRuntimeBuilder::new(screen, controller)
//!     .with_config(PanelConfig::from_file("perch.json")?)
//!     .with_media(arbiter)
//!     .spawn();
//! let snapshot = handle.snapshot();
//! handle.shutdown().await?;
//! ```

mod config;
mod countdown;
mod error;
mod logging;
mod media;
mod runtime;
mod snapshot;

pub use config::{ConfigStore, PanelConfig};
pub use countdown::{Countdown, CountdownConfig, DEFAULT_COUNTDOWN_SECS};
pub use error::{Result, RuntimeError};
pub use logging::{init_tracing, DEFAULT_LOG_FILTER};
pub use media::MediaFetcher;
pub use runtime::{ControlMessage, PanelRuntimeBuilder, RuntimeHandle};
pub use snapshot::PanelSnapshot;
