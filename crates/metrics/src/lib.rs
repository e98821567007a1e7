//! Local machine metrics for the perch panel.
//!
//! [`MetricReader`] and [`LatencyProbe`] are the OS-facing boundaries;
//! [`StatsFetcher`] and [`NetworkFetcher`] adapt them to the refresh
//! orchestrator's `SignalFetcher` contract.

mod fetchers;
mod probe;
mod reader;
mod system;

pub use fetchers::{NetworkFetcher, StatsFetcher};
pub use probe::{
    LatencyProbe, NullLatencyProbe, TcpLatencyProbe, DEFAULT_PROBE_ADDR, DEFAULT_PROBE_TIMEOUT,
};
pub use reader::{MemoryUsage, MetricReader, NetworkTotals, NullMetricReader};
pub use system::SysinfoReader;
