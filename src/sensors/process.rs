// Bounded top-N process sampling

use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::ProcessesToUpdate;

use super::{Sensor, SensorPayload, SharedSystem};
use crate::models::{ProcessReading, ProcessSample};

pub struct ProcessSensor {
    sys: SharedSystem,
    limit: usize,
}

impl ProcessSensor {
    pub(crate) fn new(sys: SharedSystem, limit: usize) -> Self {
        Self { sys, limit }
    }
}

impl Sensor for ProcessSensor {
    fn name(&self) -> &'static str {
        "process"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let sys = self.sys.clone();
        let limit = self.limit;
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_processes(ProcessesToUpdate::All, true);

            let total_mem = sys.total_memory();
            let mut processes: Vec<ProcessSample> = sys
                .processes()
                .iter()
                .map(|(pid, p)| ProcessSample {
                    pid: pid.as_u32(),
                    name: p.name().to_string_lossy().into_owned(),
                    cpu_pct: p.cpu_usage() as f64,
                    mem_pct: if total_mem > 0 {
                        p.memory() as f64 / total_mem as f64 * 100.0
                    } else {
                        0.0
                    },
                })
                .collect();

            // Combined CPU+memory ranking, heaviest first.
            processes.sort_by(|a, b| {
                (b.cpu_pct + b.mem_pct)
                    .partial_cmp(&(a.cpu_pct + a.mem_pct))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            processes.truncate(limit);

            Ok(SensorPayload::Process(ProcessReading { processes }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
