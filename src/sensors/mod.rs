// Typed system sensors. Each sensor is a pure read of one subsystem and must
// return within the deadline it is given; the orchestrator enforces the
// deadline from the outside as well.

pub(crate) mod linux;

mod cpu;
mod disk;
mod docker;
mod health;
mod host;
mod memory;
mod network;
mod process;
mod thermal;

pub use cpu::CpuSensor;
pub use disk::DiskSensor;
pub use docker::DockerSensor;
pub use health::DiskHealthSensor;
pub use host::HostSensor;
pub use memory::MemorySensor;
pub use network::{ConnectivitySensor, NetSensor};
pub use process::ProcessSensor;
pub use thermal::ThermalSensor;

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use crate::models::{
    ConnectivityReading, CpuReading, DiskHealth, DiskReading, DockerReading, HostReading,
    MemoryReading, NetReading, ProcessReading, ThermalReading,
};

/// Sum of the payloads a sensor can produce. The orchestrator pattern-matches
/// on the variant when assembling a snapshot.
#[derive(Debug, Clone)]
pub enum SensorPayload {
    Cpu(CpuReading),
    Memory(MemoryReading),
    Disk(DiskReading),
    Network(NetReading),
    Connectivity(ConnectivityReading),
    Host(HostReading),
    Docker(DockerReading),
    Thermal(ThermalReading),
    Process(ProcessReading),
    DiskHealth(Vec<DiskHealth>),
}

/// Contract every sensor implements: a stable name and a deadline-bounded,
/// side-effect-free collect.
pub trait Sensor: Send + Sync {
    fn name(&self) -> &'static str;
    fn collect(&self, deadline: Duration) -> impl Future<Output = Result<SensorPayload>> + Send;
}

/// Run a sensor under its deadline, attaching the sensor identity to any
/// failure. A sensor that overruns yields an error without blocking others.
pub(crate) async fn run_sensor<S: Sensor>(sensor: &S, deadline: Duration) -> Result<SensorPayload> {
    match tokio::time::timeout(deadline, sensor.collect(deadline)).await {
        Ok(result) => result.with_context(|| format!("sensor {}", sensor.name())),
        Err(_) => Err(anyhow!(
            "sensor {} exceeded deadline of {:?}",
            sensor.name(),
            deadline
        )),
    }
}

/// Shared sysinfo handle. CPU usage needs refresh-to-refresh deltas, so the
/// `System` must live across ticks.
pub(crate) type SharedSystem = Arc<Mutex<sysinfo::System>>;

pub(crate) fn shared_system() -> SharedSystem {
    let mut sys = sysinfo::System::new_all();
    sys.refresh_all();
    Arc::new(Mutex::new(sys))
}
