// Host identity and platform facts

use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::{ProcessesToUpdate, System};

use super::{Sensor, SensorPayload, SharedSystem, linux};
use crate::models::HostReading;

pub struct HostSensor {
    sys: SharedSystem,
}

impl HostSensor {
    pub(crate) fn new(sys: SharedSystem) -> Self {
        Self { sys }
    }
}

impl Sensor for HostSensor {
    fn name(&self) -> &'static str {
        "host"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_processes(ProcessesToUpdate::All, true);

            Ok(SensorPayload::Host(HostReading {
                hostname: System::host_name().unwrap_or_default(),
                os: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
                platform: linux::read_platform()
                    .or_else(System::long_os_version)
                    .unwrap_or_default(),
                kernel_version: System::kernel_version().unwrap_or_default(),
                uptime_secs: System::uptime(),
                process_count: sys.processes().len() as u64,
                machine_id: linux::read_machine_id().unwrap_or_default(),
                boot_id: linux::read_boot_id().unwrap_or_default(),
            }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
