// Temperature sensors via sysinfo components; always best-effort

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use sysinfo::Components;

use super::{Sensor, SensorPayload};
use crate::models::{TemperatureReading, ThermalReading};

pub struct ThermalSensor {
    components: Arc<Mutex<Components>>,
}

impl ThermalSensor {
    pub(crate) fn new() -> Self {
        Self {
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
        }
    }
}

impl Sensor for ThermalSensor {
    fn name(&self) -> &'static str {
        "thermal"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let components = self.components.clone();
        tokio::task::spawn_blocking(move || {
            let mut components = components
                .lock()
                .map_err(|e| anyhow!("sysinfo components lock poisoned: {}", e))?;
            components.refresh(true);

            let temperatures = components
                .list()
                .iter()
                .filter_map(|c| {
                    let t = c.temperature()?;
                    Some(TemperatureReading {
                        sensor_key: c.label().to_string(),
                        temperature_c: t as f64,
                        critical_c: c.critical().map(|v| v as f64),
                    })
                })
                .collect();

            Ok(SensorPayload::Thermal(ThermalReading { temperatures }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}
