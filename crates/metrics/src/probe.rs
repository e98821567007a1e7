//! Round-trip latency probes.

use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::Instant;

/// Default probe target (a public DNS resolver).
pub const DEFAULT_PROBE_ADDR: &str = "1.1.1.1:443";

/// Default connect budget.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Measures round-trip latency to some host.
#[async_trait]
pub trait LatencyProbe: Send + Sync {
    /// Latency in milliseconds, `None` when unreachable.
    async fn probe(&self) -> Option<f64>;
}

/// Times a TCP handshake, which needs no raw-socket privileges.
#[derive(Debug, Clone)]
pub struct TcpLatencyProbe {
    addr: String,
    timeout: Duration,
}

impl TcpLatencyProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Default for TcpLatencyProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_ADDR, DEFAULT_PROBE_TIMEOUT)
    }
}

#[async_trait]
impl LatencyProbe for TcpLatencyProbe {
    async fn probe(&self) -> Option<f64> {
        let start = Instant::now();
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_stream)) => Some(start.elapsed().as_secs_f64() * 1000.0),
            Ok(Err(e)) => {
                tracing::debug!(addr = %self.addr, error = %e, "latency probe failed");
                None
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, "latency probe timed out");
                None
            }
        }
    }
}

/// Probe that never answers.
pub struct NullLatencyProbe;

#[async_trait]
impl LatencyProbe for NullLatencyProbe {
    async fn probe(&self) -> Option<f64> {
        None
    }
}
