// Flagging result models

use serde::{Deserialize, Serialize};

/// The domain implicated as the dominant driver of the current severity;
/// serializes to lowercase JSON (e.g. "memory").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimaryCause {
    Cpu,
    Memory,
    Disk,
    Network,
    Docker,
    Thermal,
    #[default]
    None,
}

impl PrimaryCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrimaryCause::Cpu => "cpu",
            PrimaryCause::Memory => "memory",
            PrimaryCause::Disk => "disk",
            PrimaryCause::Network => "network",
            PrimaryCause::Docker => "docker",
            PrimaryCause::Thermal => "thermal",
            PrimaryCause::None => "none",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cpu" => PrimaryCause::Cpu,
            "memory" => PrimaryCause::Memory,
            "disk" => PrimaryCause::Disk,
            "network" => PrimaryCause::Network,
            "docker" => PrimaryCause::Docker,
            "thermal" => PrimaryCause::Thermal,
            _ => PrimaryCause::None,
        }
    }
}

/// The kind of child entity a cause points at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CauseEntityType {
    Container,
    Process,
    Disk,
    Netif,
    Mount,
    Sensor,
    #[default]
    None,
}

impl CauseEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CauseEntityType::Container => "container",
            CauseEntityType::Process => "process",
            CauseEntityType::Disk => "disk",
            CauseEntityType::Netif => "netif",
            CauseEntityType::Mount => "mount",
            CauseEntityType::Sensor => "sensor",
            CauseEntityType::None => "none",
        }
    }
}

/// Result of evaluating the flagging policy against one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFlags {
    pub host_offline: bool,
    pub cpu_overloaded: bool,
    pub memory_pressure: bool,
    pub memory_starvation: bool,
    pub swap_thrashing: bool,
    pub disk_space_critical: bool,
    pub inode_exhaustion: bool,
    pub disk_io_saturation: bool,
    pub disk_health_failed: bool,
    pub network_latency_degraded: bool,
    pub network_packet_loss: bool,
    pub network_interface_errors: bool,
    pub docker_unavailable: bool,
    pub container_cpu_hog: bool,
    pub container_memory_pressure: bool,
    pub container_oom_risk: bool,
    pub runaway_process_cpu: bool,
    pub runaway_process_memory: bool,
    pub thermal_pressure: bool,
    pub system_at_risk: bool,

    /// 0 ok, 1 info, 2 warn, 3 critical, 4 fatal.
    pub severity_level: u8,
    /// 0..=100.
    pub risk_score: u8,

    pub primary_cause: PrimaryCause,
    pub cause_entity_type: CauseEntityType,
    pub cause_entity_key: String,
    pub explanation: String,
}

impl SnapshotFlags {
    /// Flag set packed into a bitmask, bit order matching field declaration
    /// order (host_offline = bit 0 .. system_at_risk = bit 19).
    pub fn bitmask(&self) -> u64 {
        let bits = [
            self.host_offline,
            self.cpu_overloaded,
            self.memory_pressure,
            self.memory_starvation,
            self.swap_thrashing,
            self.disk_space_critical,
            self.inode_exhaustion,
            self.disk_io_saturation,
            self.disk_health_failed,
            self.network_latency_degraded,
            self.network_packet_loss,
            self.network_interface_errors,
            self.docker_unavailable,
            self.container_cpu_hog,
            self.container_memory_pressure,
            self.container_oom_risk,
            self.runaway_process_cpu,
            self.runaway_process_memory,
            self.thermal_pressure,
            self.system_at_risk,
        ];
        bits.iter()
            .enumerate()
            .fold(0u64, |m, (i, &b)| if b { m | (1 << i) } else { m })
    }

    /// Names of the triggered flags, in bitmask bit order.
    pub fn triggered(&self) -> Vec<&'static str> {
        let named = [
            (self.host_offline, "host_offline"),
            (self.cpu_overloaded, "cpu_overloaded"),
            (self.memory_pressure, "memory_pressure"),
            (self.memory_starvation, "memory_starvation"),
            (self.swap_thrashing, "swap_thrashing"),
            (self.disk_space_critical, "disk_space_critical"),
            (self.inode_exhaustion, "inode_exhaustion"),
            (self.disk_io_saturation, "disk_io_saturation"),
            (self.disk_health_failed, "disk_health_failed"),
            (self.network_latency_degraded, "network_latency_degraded"),
            (self.network_packet_loss, "network_packet_loss"),
            (self.network_interface_errors, "network_interface_errors"),
            (self.docker_unavailable, "docker_unavailable"),
            (self.container_cpu_hog, "container_cpu_hog"),
            (self.container_memory_pressure, "container_memory_pressure"),
            (self.container_oom_risk, "container_oom_risk"),
            (self.runaway_process_cpu, "runaway_process_cpu"),
            (self.runaway_process_memory, "runaway_process_memory"),
            (self.thermal_pressure, "thermal_pressure"),
            (self.system_at_risk, "system_at_risk"),
        ];
        named
            .iter()
            .filter(|(on, _)| *on)
            .map(|(_, name)| *name)
            .collect()
    }
}
