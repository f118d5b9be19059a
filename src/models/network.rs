// Network interface and connectivity models

use serde::{Deserialize, Serialize};

/// Cumulative per-interface counters since boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetInterfaceCounters {
    pub name: String,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    pub packets_sent: u64,
    pub packets_recv: u64,
    pub err_in: u64,
    pub err_out: u64,
    pub drop_in: u64,
    pub drop_out: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetReading {
    pub interfaces: Vec<NetInterfaceCounters>,
}

/// Outbound probe result plus active TCP connection count; slow tier only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityReading {
    pub latency_ms: f64,
    pub is_connected: bool,
    pub active_tcp: u32,
}

impl Default for ConnectivityReading {
    fn default() -> Self {
        // Connectivity is assumed until the slow tier has actually probed.
        Self {
            latency_ms: 0.0,
            is_connected: true,
            active_tcp: 0,
        }
    }
}
