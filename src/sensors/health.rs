// Disk health via smartctl; requires the external tool when present

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::Disks;
use tokio::process::Command;

use super::{Sensor, SensorPayload};
use crate::models::{DiskHealth, DiskHealthStatus};

const PER_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DiskHealthSensor;

impl DiskHealthSensor {
    pub(crate) fn new() -> Self {
        Self
    }

    async fn smartctl_available() -> bool {
        matches!(
            Command::new("smartctl").arg("--version").output().await,
            Ok(out) if out.status.success()
        )
    }

    async fn check_device(device: &str, deadline: Duration) -> DiskHealth {
        let run = Command::new("smartctl").args(["-H", device]).output();
        let (status, message) = match tokio::time::timeout(deadline, run).await {
            Ok(Ok(out)) => {
                let text = String::from_utf8_lossy(&out.stdout);
                if text.contains("PASSED") {
                    (DiskHealthStatus::Passed, "SMART health passed".to_string())
                } else if text.contains("FAILED") {
                    (DiskHealthStatus::Failed, "SMART health failed".to_string())
                } else {
                    (
                        DiskHealthStatus::Unknown,
                        "smartctl output unavailable".to_string(),
                    )
                }
            }
            Ok(Err(e)) => (DiskHealthStatus::Unknown, e.to_string()),
            Err(_) => (DiskHealthStatus::Unknown, "smartctl timed out".to_string()),
        };
        DiskHealth {
            device: device.to_string(),
            status,
            message,
        }
    }
}

impl Sensor for DiskHealthSensor {
    fn name(&self) -> &'static str {
        "disk-health"
    }

    async fn collect(&self, deadline: Duration) -> Result<SensorPayload> {
        if !Self::smartctl_available().await {
            return Ok(SensorPayload::DiskHealth(Vec::new()));
        }

        let devices: Vec<String> = tokio::task::spawn_blocking(|| {
            let disks = Disks::new_with_refreshed_list();
            let mut seen = HashSet::new();
            disks
                .list()
                .iter()
                .map(|d| d.name().to_string_lossy().into_owned())
                .filter(|name| !name.is_empty() && seen.insert(name.clone()))
                .collect()
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?;

        let per_device = PER_DEVICE_TIMEOUT.min(deadline);
        let mut health = Vec::with_capacity(devices.len());
        for device in &devices {
            health.push(Self::check_device(device, per_device).await);
        }
        Ok(SensorPayload::DiskHealth(health))
    }
}
