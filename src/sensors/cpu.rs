// CPU utilization, model and load averages via sysinfo

use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::System;

use super::{Sensor, SensorPayload, SharedSystem, linux};
use crate::models::{CpuReading, LoadAverages};

pub struct CpuSensor {
    sys: SharedSystem,
}

impl CpuSensor {
    pub(crate) fn new(sys: SharedSystem) -> Self {
        Self { sys }
    }
}

impl Sensor for CpuSensor {
    fn name(&self) -> &'static str {
        "cpu"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_cpu_all();

            let per_core: Vec<f64> = sys
                .cpus()
                .iter()
                .map(|c| (c.cpu_usage() as f64).clamp(0.0, 100.0))
                .collect();
            let usage = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
            let model = linux::read_cpu_model()
                .or_else(|| {
                    sys.cpus()
                        .first()
                        .map(|c| c.name().to_string())
                        .filter(|s| !s.is_empty() && s != "cpu0")
                })
                .unwrap_or_else(|| "Unknown".into());
            let load = System::load_average();

            Ok(SensorPayload::Cpu(CpuReading {
                usage_pct: usage,
                logical_cores: sys.cpus().len() as u32,
                per_core_pct: per_core,
                model,
                load: LoadAverages {
                    one: load.one,
                    five: load.five,
                    fifteen: load.fifteen,
                },
            }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
