// Temperature sensor models

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub sensor_key: String,
    pub temperature_c: f64,
    /// Sensor-reported critical threshold, when the hardware exposes one.
    pub critical_c: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThermalReading {
    pub temperatures: Vec<TemperatureReading>,
}
