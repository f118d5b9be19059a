// Disk usage, inodes and cumulative IO counters

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::Disks;

use super::{Sensor, SensorPayload, linux};
use crate::models::{DiskReading, PartitionUsage};

pub struct DiskSensor {
    disks: Arc<Mutex<Disks>>,
}

impl DiskSensor {
    pub(crate) fn new() -> Self {
        Self {
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
        }
    }
}

impl Sensor for DiskSensor {
    fn name(&self) -> &'static str {
        "disk"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks = disks
                .lock()
                .map_err(|e| anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks.refresh(true);

            let mut reading = DiskReading::default();
            for d in disks.list() {
                let mountpoint = d.mount_point().to_string_lossy().into_owned();
                let total = d.total_space();
                let available = d.available_space();
                let used_pct = if total > 0 {
                    (total.saturating_sub(available)) as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                let (inode_pct, inode_total) = linux::inode_usage(&mountpoint).unwrap_or((0.0, 0));

                if mountpoint == "/" {
                    reading.root_usage_pct = used_pct;
                    reading.root_total_bytes = total;
                    reading.root_inode_usage_pct = inode_pct;
                    reading.root_inode_total = inode_total;
                }
                reading.partitions.push(PartitionUsage {
                    mountpoint,
                    device: d.name().to_string_lossy().into_owned(),
                    fstype: d.file_system().to_string_lossy().into_owned(),
                    used_pct,
                    total_bytes: total,
                    available_bytes: available,
                    inode_usage_pct: inode_pct,
                    inode_total,
                });
            }

            reading.io_counters = linux::read_diskstats();
            Ok(SensorPayload::Disk(reading))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
