// CPU, memory and host identity models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadAverages {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// CPU utilization as sampled by the CPU sensor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuReading {
    pub usage_pct: f64,
    pub per_core_pct: Vec<f64>,
    pub model: String,
    pub logical_cores: u32,
    pub load: LoadAverages,
}

/// Memory and swap, byte-precise.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryReading {
    pub usage_pct: f64,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub cached_bytes: u64,
    pub buffered_bytes: u64,
    pub swap_usage_pct: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
}

/// Host identity and platform facts; slow tier only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostReading {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub kernel_version: String,
    pub uptime_secs: u64,
    pub process_count: u64,
    pub machine_id: String,
    pub boot_id: String,
}
