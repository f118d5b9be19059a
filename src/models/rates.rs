// Derived-rate models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Summed counters of the most recent prior snapshot for a host, used as the
/// baseline for rate computation. `collected_at` is `None` when no prior
/// snapshot exists.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrevCounters {
    pub collected_at: Option<DateTime<Utc>>,

    pub disk_read_bytes: u64,
    pub disk_write_bytes: u64,
    pub disk_read_count: u64,
    pub disk_write_count: u64,
    pub disk_read_time_ms: u64,
    pub disk_write_time_ms: u64,

    pub net_bytes_sent: u64,
    pub net_bytes_recv: u64,
    pub net_err_in: u64,
    pub net_err_out: u64,
    pub net_drop_in: u64,
    pub net_drop_out: u64,
}

/// Per-second rates derived from counter deltas between two snapshots.
/// All fields are non-negative; zero when no baseline exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedRates {
    pub disk_read_bps: f64,
    pub disk_write_bps: f64,
    pub disk_read_iops: f64,
    pub disk_write_iops: f64,
    pub disk_avg_read_lat_ms: f64,
    pub disk_avg_write_lat_ms: f64,

    pub net_tx_bps: f64,
    pub net_rx_bps: f64,
    pub net_err_per_s: f64,
    pub net_drop_per_s: f64,
}
