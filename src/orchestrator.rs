// Sensor orchestrator: parallel fan-out across the fast and slow tiers, one
// deadline per tier, merge of the two into a single raw snapshot.

use std::future::Future;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::warn;

use crate::config::CollectorConfig;
use crate::models::{
    ConnectivityReading, DockerReading, HostReading, NetReading, ProcessReading, RawSnapshot,
    ThermalReading,
};
use crate::sensors::{
    ConnectivitySensor, CpuSensor, DiskHealthSensor, DiskSensor, DockerSensor, HostSensor,
    MemorySensor, NetSensor, ProcessSensor, SensorPayload, ThermalSensor, run_sensor,
    shared_system,
};

/// Contract for anything that can produce tier snapshots. The pipeline driver
/// and the external consumer APIs both speak this split-tier form.
pub trait MetricSource: Send + Sync {
    fn collect_fast(&self) -> impl Future<Output = Result<RawSnapshot>> + Send;
    fn collect_slow(&self) -> impl Future<Output = Result<RawSnapshot>> + Send;
}

pub struct SensorOrchestrator {
    cpu: CpuSensor,
    memory: MemorySensor,
    disk: DiskSensor,
    net: NetSensor,
    docker: Option<DockerSensor>,
    processes: ProcessSensor,

    host: HostSensor,
    health: Option<DiskHealthSensor>,
    thermal: Option<ThermalSensor>,
    connectivity: ConnectivitySensor,

    fast_timeout: Duration,
    slow_timeout: Duration,
}

impl SensorOrchestrator {
    pub fn new(cfg: &CollectorConfig) -> Self {
        let sys = shared_system();
        Self {
            cpu: CpuSensor::new(sys.clone()),
            memory: MemorySensor::new(sys.clone()),
            disk: DiskSensor::new(),
            net: NetSensor::new(),
            docker: cfg.docker_enabled.then(DockerSensor::new),
            processes: ProcessSensor::new(sys.clone(), cfg.top_process_count),
            host: HostSensor::new(sys),
            health: cfg.disk_health_enabled.then(DiskHealthSensor::new),
            thermal: cfg.thermal_enabled.then(ThermalSensor::new),
            connectivity: ConnectivitySensor::new(cfg.probe_endpoint.clone(), cfg.probe_timeout),
            fast_timeout: cfg.fast_timeout,
            slow_timeout: cfg.slow_timeout,
        }
    }

    /// High-frequency tier: CPU, memory, disk usage/IO, net counters, docker,
    /// processes. A failure in the CPU/memory/disk trio is fatal to the tick;
    /// the rest degrade to empty.
    pub async fn collect_fast(&self) -> Result<RawSnapshot> {
        let deadline = self.fast_timeout;
        let (cpu, memory, disk, net, docker, processes) = tokio::join!(
            run_sensor(&self.cpu, deadline),
            run_sensor(&self.memory, deadline),
            run_sensor(&self.disk, deadline),
            run_sensor(&self.net, deadline),
            async {
                match &self.docker {
                    Some(sensor) => run_sensor(sensor, deadline).await,
                    None => Ok(SensorPayload::Docker(DockerReading::default())),
                }
            },
            run_sensor(&self.processes, deadline),
        );

        let SensorPayload::Cpu(cpu) = cpu? else {
            bail!("cpu sensor payload mismatch")
        };
        let SensorPayload::Memory(memory) = memory? else {
            bail!("memory sensor payload mismatch")
        };
        let SensorPayload::Disk(disk) = disk? else {
            bail!("disk sensor payload mismatch")
        };

        let net = match net {
            Ok(SensorPayload::Network(r)) => r,
            Ok(_) => NetReading::default(),
            Err(e) => {
                warn!("network counters degraded to empty: {:#}", e);
                NetReading::default()
            }
        };
        let docker = match docker {
            Ok(SensorPayload::Docker(r)) => r,
            Ok(_) => DockerReading::default(),
            Err(e) => {
                warn!("docker metrics degraded to empty: {:#}", e);
                DockerReading::default()
            }
        };
        let processes = match processes {
            Ok(SensorPayload::Process(r)) => r,
            Ok(_) => ProcessReading::default(),
            Err(e) => {
                warn!("process metrics degraded to empty: {:#}", e);
                ProcessReading::default()
            }
        };

        Ok(RawSnapshot {
            cpu_usage_pct: cpu.usage_pct,
            cpu_per_core_pct: cpu.per_core_pct,
            cpu_model: cpu.model,
            cpu_cores_logical: cpu.logical_cores,
            load: cpu.load,

            ram_usage_pct: memory.usage_pct,
            ram_total_bytes: memory.total_bytes,
            ram_available_bytes: memory.available_bytes,
            ram_used_bytes: memory.used_bytes,
            ram_free_bytes: memory.free_bytes,
            ram_cached_bytes: memory.cached_bytes,
            ram_buffered_bytes: memory.buffered_bytes,
            swap_usage_pct: memory.swap_usage_pct,
            swap_total_bytes: memory.swap_total_bytes,
            swap_used_bytes: memory.swap_used_bytes,

            disk_usage_pct: disk.root_usage_pct,
            disk_total_bytes: disk.root_total_bytes,
            inode_usage_pct: disk.root_inode_usage_pct,
            inode_total: disk.root_inode_total,
            partitions: disk.partitions,
            io_counters: disk.io_counters,

            net_interfaces: net.interfaces,
            // Connectivity is only probed by the slow tier; assume online
            // until it has run.
            is_connected: true,

            docker_available: docker.available,
            containers: docker.containers,
            processes: processes.processes,

            ..Default::default()
        })
    }

    /// Low-frequency tier: host info, disk health, connectivity probe,
    /// active TCP, temperatures. Every sensor degrades to empty on failure.
    pub async fn collect_slow(&self) -> Result<RawSnapshot> {
        let deadline = self.slow_timeout;
        let (host, health, thermal, connectivity) = tokio::join!(
            run_sensor(&self.host, deadline),
            async {
                match &self.health {
                    Some(sensor) => run_sensor(sensor, deadline).await,
                    None => Ok(SensorPayload::DiskHealth(Vec::new())),
                }
            },
            async {
                match &self.thermal {
                    Some(sensor) => run_sensor(sensor, deadline).await,
                    None => Ok(SensorPayload::Thermal(ThermalReading::default())),
                }
            },
            run_sensor(&self.connectivity, deadline),
        );

        let host = match host {
            Ok(SensorPayload::Host(r)) => r,
            Ok(_) => HostReading::default(),
            Err(e) => {
                warn!("host info degraded to empty: {:#}", e);
                HostReading::default()
            }
        };
        let disk_health = match health {
            Ok(SensorPayload::DiskHealth(h)) => h,
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!("disk health degraded to empty: {:#}", e);
                Vec::new()
            }
        };
        let thermal = match thermal {
            Ok(SensorPayload::Thermal(r)) => r,
            Ok(_) => ThermalReading::default(),
            Err(e) => {
                warn!("temperatures degraded to empty: {:#}", e);
                ThermalReading::default()
            }
        };
        let connectivity = match connectivity {
            Ok(SensorPayload::Connectivity(r)) => r,
            Ok(_) => ConnectivityReading::default(),
            Err(e) => {
                warn!("connectivity probe degraded: {:#}", e);
                ConnectivityReading::default()
            }
        };

        let mut snapshot = RawSnapshot {
            disk_health,
            hostname: host.hostname,
            os: host.os,
            platform: host.platform,
            kernel_version: host.kernel_version,
            uptime_secs: host.uptime_secs,
            process_count: host.process_count,
            machine_id: host.machine_id,
            boot_id: host.boot_id,
            temperatures: thermal.temperatures,
            ..Default::default()
        };
        snapshot.apply_connectivity(connectivity);
        Ok(snapshot)
    }

    /// Merge rule: fast-tier fields are authoritative for their own domain,
    /// slow-tier fields overlay theirs. With no slow snapshot yet, slow-tier
    /// fields keep their zero/unknown sentinel.
    pub fn merge(fast: &RawSnapshot, slow: Option<&RawSnapshot>) -> RawSnapshot {
        let mut merged = fast.clone();
        if let Some(slow) = slow {
            merged.net_latency_ms = slow.net_latency_ms;
            merged.is_connected = slow.is_connected;
            merged.active_tcp = slow.active_tcp;
            merged.disk_health = slow.disk_health.clone();
            merged.hostname = slow.hostname.clone();
            merged.os = slow.os.clone();
            merged.platform = slow.platform.clone();
            merged.kernel_version = slow.kernel_version.clone();
            merged.uptime_secs = slow.uptime_secs;
            merged.process_count = slow.process_count;
            merged.machine_id = slow.machine_id.clone();
            merged.boot_id = slow.boot_id.clone();
            merged.temperatures = slow.temperatures.clone();
        }
        merged
    }
}

impl MetricSource for SensorOrchestrator {
    fn collect_fast(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        SensorOrchestrator::collect_fast(self)
    }

    fn collect_slow(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        SensorOrchestrator::collect_slow(self)
    }
}
