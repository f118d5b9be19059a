// Storage / disk models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionUsage {
    pub mountpoint: String,
    pub device: String,
    pub fstype: String,
    pub used_pct: f64,
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub inode_usage_pct: f64,
    pub inode_total: u64,
}

/// Cumulative per-device IO counters since boot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskIoCounters {
    pub device: String,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_count: u64,
    pub write_count: u64,
    pub read_time_ms: u64,
    pub write_time_ms: u64,
}

/// SMART verdict; serializes to lowercase JSON (e.g. "passed").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskHealthStatus {
    Passed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl DiskHealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiskHealthStatus::Passed => "passed",
            DiskHealthStatus::Failed => "failed",
            DiskHealthStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskHealth {
    pub device: String,
    pub status: DiskHealthStatus,
    pub message: String,
}

/// Disk sensor payload: root filesystem scalars plus per-mount and per-device detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskReading {
    pub root_usage_pct: f64,
    pub root_total_bytes: u64,
    pub root_inode_usage_pct: f64,
    pub root_inode_total: u64,
    pub partitions: Vec<PartitionUsage>,
    pub io_counters: Vec<DiskIoCounters>,
}
