//! Metric reader traits.
//!
//! Readers are synchronous "sample now" calls. They may block briefly on OS
//! calls, so fetchers run them on the blocking pool.

/// Memory in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Cumulative interface counters, summed over all interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NetworkTotals {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Local machine metrics.
pub trait MetricReader: Send + Sync {
    /// Global CPU usage in percent.
    fn cpu_percent(&self) -> f32;

    fn memory(&self) -> MemoryUsage;

    /// GPU usage in percent, when the platform exposes it.
    fn gpu_percent(&self) -> Option<f32> {
        None
    }

    /// Battery charge in percent; `None` on machines without one.
    fn battery_percent(&self) -> Option<f32> {
        None
    }

    fn network_totals(&self) -> NetworkTotals;
}

/// Null implementation for testing or unsupported platforms.
pub struct NullMetricReader;

impl MetricReader for NullMetricReader {
    fn cpu_percent(&self) -> f32 {
        0.0
    }

    fn memory(&self) -> MemoryUsage {
        MemoryUsage::default()
    }

    fn network_totals(&self) -> NetworkTotals {
        NetworkTotals::default()
    }
}
