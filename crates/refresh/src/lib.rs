//! Signal refresh for the perch panel.
//!
//! Every tracked signal (media, weather, calendar, network, stats) is a row
//! in one schedule table evaluated against one shared clock:
//!
//! - disabled signals are `Hidden` and never fetched;
//! - an enabled signal fetches when its cadence elapses or it is forced,
//!   unless a fetch is already in flight (a due tick never queues);
//! - completion of any kind stamps `last_fetch`, so failures wait for the
//!   next cadence boundary instead of retrying in a loop;
//! - stats are skipped entirely while the panel is collapsed.
//!
//! Fetches run on spawned tasks and report back as [`FetchCompletion`]s.
//! A generation counter per signal drops completions from fetches that were
//! cancelled by a toggle or shutdown.

mod config;
mod error;
mod fetcher;
mod orchestrator;
mod schedule;
mod signal;
mod value;

pub use config::{SignalConfig, SignalsConfig};
pub use error::{FetchError, FetchResult};
pub use fetcher::{SignalFetcher, SignalFetcherRef, StaticFetcher};
pub use orchestrator::{CompletionSender, FetchCompletion, RefreshOrchestrator};
pub use schedule::SignalSchedule;
pub use signal::SignalKind;
pub use value::{
    CalendarEntry, NetworkStatus, SignalState, SignalValue, SystemStats, WeatherReport,
};
