// Memory and swap via sysinfo, cached/buffered from /proc/meminfo

use std::time::Duration;

use anyhow::{Result, anyhow};

use super::{Sensor, SensorPayload, SharedSystem, linux};
use crate::models::MemoryReading;

pub struct MemorySensor {
    sys: SharedSystem,
}

impl MemorySensor {
    pub(crate) fn new(sys: SharedSystem) -> Self {
        Self { sys }
    }
}

impl Sensor for MemorySensor {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_memory();

            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            let usage_pct = if total > 0 {
                used as f64 / total as f64 * 100.0
            } else {
                0.0
            };

            let swap_total = sys.total_swap();
            let swap_used = sys.used_swap();
            let swap_usage_pct = if swap_total > 0 {
                swap_used as f64 / swap_total as f64 * 100.0
            } else {
                0.0
            };

            let (cached, buffered) = linux::read_cached_buffers();

            Ok(SensorPayload::Memory(MemoryReading {
                usage_pct,
                total_bytes: total,
                available_bytes: available,
                used_bytes: used,
                free_bytes: sys.free_memory(),
                cached_bytes: cached,
                buffered_bytes: buffered,
                swap_usage_pct,
                swap_total_bytes: swap_total,
                swap_used_bytes: swap_used,
            }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
