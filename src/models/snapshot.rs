// Raw and normalized snapshot models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ConnectivityReading, ContainerStat, DiskHealth, DiskIoCounters, LoadAverages,
    NetInterfaceCounters, PartitionUsage, TemperatureReading, TopProcess,
};

/// Which tier produced a snapshot; serializes to lowercase JSON (e.g. "merged").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Fast,
    Slow,
    Merged,
}

impl SnapshotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotKind::Fast => "fast",
            SnapshotKind::Slow => "slow",
            SnapshotKind::Merged => "merged",
        }
    }
}

/// Stable host identity. `agent_id` is required and owned by configuration;
/// machine/boot ids fall back to what the host sensor observed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostIdentity {
    pub agent_id: String,
    pub machine_id: String,
    pub boot_id: String,
}

/// Union of all sensor payloads for one collection pass. Collections are
/// always concrete (possibly empty) sequences; slow-tier fields keep their
/// zero/unknown sentinel until that tier has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
    // CPU
    pub cpu_usage_pct: f64,
    pub cpu_per_core_pct: Vec<f64>,
    pub cpu_model: String,
    pub cpu_cores_logical: u32,
    pub load: LoadAverages,

    // Memory (bytes)
    pub ram_usage_pct: f64,
    pub ram_total_bytes: u64,
    pub ram_available_bytes: u64,
    pub ram_used_bytes: u64,
    pub ram_free_bytes: u64,
    pub ram_cached_bytes: u64,
    pub ram_buffered_bytes: u64,
    pub swap_usage_pct: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,

    // Disk, root filesystem
    pub disk_usage_pct: f64,
    pub disk_total_bytes: u64,
    pub inode_usage_pct: f64,
    pub inode_total: u64,

    // Disk detail
    pub partitions: Vec<PartitionUsage>,
    pub io_counters: Vec<DiskIoCounters>,
    pub disk_health: Vec<DiskHealth>,

    // Network
    pub net_latency_ms: f64,
    pub is_connected: bool,
    pub active_tcp: u32,
    pub net_interfaces: Vec<NetInterfaceCounters>,

    // Docker
    pub docker_available: bool,
    pub containers: Vec<ContainerStat>,

    // Host info
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub kernel_version: String,
    pub uptime_secs: u64,
    pub process_count: u64,
    pub machine_id: String,
    pub boot_id: String,

    // Physical
    pub temperatures: Vec<TemperatureReading>,

    // Processes, unranked
    pub processes: Vec<super::ProcessSample>,
}

impl RawSnapshot {
    /// Fold a connectivity probe into the snapshot.
    pub fn apply_connectivity(&mut self, c: ConnectivityReading) {
        self.net_latency_ms = c.latency_ms;
        self.is_connected = c.is_connected;
        self.active_tcp = c.active_tcp;
    }
}

/// The canonical snapshot consumed by every downstream stage: a RawSnapshot
/// with host identity, a kind tag, a collection timestamp and ranked
/// processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSnapshot {
    pub collected_at: DateTime<Utc>,
    pub kind: SnapshotKind,

    pub agent_id: String,
    pub machine_id: String,
    pub boot_id: String,
    pub hostname: String,

    pub cpu_usage_pct: f64,
    pub cpu_per_core_pct: Vec<f64>,
    pub cpu_model: String,
    pub cpu_cores_logical: u32,
    pub load: LoadAverages,

    pub ram_usage_pct: f64,
    pub ram_total_bytes: u64,
    pub ram_available_bytes: u64,
    pub ram_used_bytes: u64,
    pub ram_free_bytes: u64,
    pub ram_cached_bytes: u64,
    pub ram_buffered_bytes: u64,
    pub swap_usage_pct: f64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,

    pub disk_usage_pct: f64,
    pub disk_total_bytes: u64,
    pub inode_usage_pct: f64,
    pub inode_total: u64,

    pub partitions: Vec<PartitionUsage>,
    pub io_counters: Vec<DiskIoCounters>,
    pub disk_health: Vec<DiskHealth>,

    pub net_latency_ms: f64,
    pub is_connected: bool,
    pub active_tcp: u32,
    pub net_interfaces: Vec<NetInterfaceCounters>,

    pub docker_available: bool,
    pub containers: Vec<ContainerStat>,

    pub os: String,
    pub platform: String,
    pub kernel_version: String,
    pub uptime_secs: u64,
    pub process_count: u64,

    pub temperatures: Vec<TemperatureReading>,
    pub top_processes: Vec<TopProcess>,
}
