//! `sysinfo`-backed reader.

use crate::reader::{MemoryUsage, MetricReader, NetworkTotals};
use std::sync::{Mutex, PoisonError};
use sysinfo::{Networks, System};

/// Reads CPU, memory and interface counters through `sysinfo`.
///
/// CPU usage is computed between consecutive refreshes, so the first
/// reading after construction is 0.
pub struct SysinfoReader {
    system: Mutex<System>,
    networks: Mutex<Networks>,
}

impl SysinfoReader {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_usage();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
        }
    }
}

impl Default for SysinfoReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricReader for SysinfoReader {
    fn cpu_percent(&self) -> f32 {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_cpu_usage();
        system.global_cpu_usage()
    }

    fn memory(&self) -> MemoryUsage {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        MemoryUsage {
            used_bytes: system.used_memory(),
            total_bytes: system.total_memory(),
        }
    }

    fn network_totals(&self) -> NetworkTotals {
        let mut networks = self.networks.lock().unwrap_or_else(PoisonError::into_inner);
        networks.refresh();
        networks
            .list()
            .values()
            .fold(NetworkTotals::default(), |acc, data| NetworkTotals {
                rx_bytes: acc.rx_bytes.saturating_add(data.total_received()),
                tx_bytes: acc.tx_bytes.saturating_add(data.total_transmitted()),
            })
    }
}
