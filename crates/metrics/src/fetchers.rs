//! Signal fetchers over metric readers.

use crate::probe::LatencyProbe;
use crate::reader::{MetricReader, NetworkTotals};
use async_trait::async_trait;
use perch_refresh::{FetchError, FetchResult, NetworkStatus, SignalFetcher, SignalValue, SystemStats};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Samples CPU, memory, GPU and battery on the blocking pool.
pub struct StatsFetcher {
    reader: Arc<dyn MetricReader>,
}

impl StatsFetcher {
    pub fn new(reader: Arc<dyn MetricReader>) -> Self {
        Self { reader }
    }
}

#[async_trait]
impl SignalFetcher for StatsFetcher {
    async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
        let reader = Arc::clone(&self.reader);
        let stats = tokio::task::spawn_blocking(move || {
            let memory = reader.memory();
            SystemStats {
                cpu_percent: reader.cpu_percent(),
                memory_used_bytes: memory.used_bytes,
                memory_total_bytes: memory.total_bytes,
                gpu_percent: reader.gpu_percent(),
                battery_percent: reader.battery_percent(),
            }
        })
        .await
        .map_err(|e| FetchError::failed(format!("stats reader panicked: {e}")))?;

        Ok(SignalValue::Stats(stats))
    }
}

#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Instant,
    totals: NetworkTotals,
}

/// Throughput since the previous fetch plus an optional latency probe.
///
/// The first fetch has no baseline and reports zero throughput.
pub struct NetworkFetcher {
    reader: Arc<dyn MetricReader>,
    probe: Option<Arc<dyn LatencyProbe>>,
    last: Mutex<Option<Sample>>,
}

impl NetworkFetcher {
    pub fn new(reader: Arc<dyn MetricReader>) -> Self {
        Self {
            reader,
            probe: None,
            last: Mutex::new(None),
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn LatencyProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    fn rates(&self, sample: Sample) -> (f64, f64) {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let rates = match *last {
            Some(previous) => throughput(previous, sample),
            None => (0.0, 0.0),
        };
        *last = Some(sample);
        rates
    }
}

fn throughput(previous: Sample, current: Sample) -> (f64, f64) {
    let elapsed = current.at.saturating_duration_since(previous.at).as_secs_f64();
    if elapsed <= 0.0 {
        return (0.0, 0.0);
    }
    // Counters can reset when an interface goes away.
    let rx = current.totals.rx_bytes.saturating_sub(previous.totals.rx_bytes) as f64;
    let tx = current.totals.tx_bytes.saturating_sub(previous.totals.tx_bytes) as f64;
    (rx / elapsed, tx / elapsed)
}

#[async_trait]
impl SignalFetcher for NetworkFetcher {
    async fn fetch(&self, _cancel: CancellationToken) -> FetchResult<SignalValue> {
        let reader = Arc::clone(&self.reader);
        let totals = tokio::task::spawn_blocking(move || reader.network_totals())
            .await
            .map_err(|e| FetchError::failed(format!("network reader panicked: {e}")))?;
        let (rx_bytes_per_sec, tx_bytes_per_sec) = self.rates(Sample {
            at: Instant::now(),
            totals,
        });

        let latency_ms = match &self.probe {
            Some(probe) => probe.probe().await,
            None => None,
        };

        Ok(SignalValue::Network(NetworkStatus {
            rx_bytes_per_sec,
            tx_bytes_per_sec,
            latency_ms,
        }))
    }
}
