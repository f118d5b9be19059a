// Flagging policy: a pure function from (snapshot, rates, policy, prior
// docker availability) to flags, severity, risk score and cause attribution.

use crate::models::{
    CauseEntityType, DerivedRates, DiskHealthStatus, NormalizedSnapshot, PartitionUsage,
    PrimaryCause, SnapshotFlags,
};

const SEV_WARN: u8 = 2;
const SEV_CRIT: u8 = 3;
const SEV_FATAL: u8 = 4;

/// Warning/critical pair for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub warning: f64,
    pub critical: f64,
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Self { warning, critical }
    }
}

/// Full flagging configuration.
#[derive(Debug, Clone)]
pub struct FlagPolicy {
    pub cpu: Thresholds,
    pub ram: Thresholds,
    pub disk: Thresholds,
    pub inode: Thresholds,
    /// Milliseconds.
    pub net_latency: Thresholds,
    /// Connection counts.
    pub active_tcp: Thresholds,

    /// Swap usage percent above which swap thrashing is raised.
    pub swap_critical_pct: f64,
    /// Available/total percent under which memory pressure becomes starvation.
    pub starvation_available_pct: f64,
    /// Absolute free-space floor per partition, regardless of percentage.
    pub disk_free_floor_bytes: u64,
    /// Instantaneous disk throughput above which IO saturation is raised.
    pub disk_io_bps_critical: f64,
    /// Container memory percent above which OOM risk is raised.
    pub container_oom_pct: f64,
    /// Critical temperature for sensors that do not report their own.
    pub thermal_critical_fallback_c: f64,
    /// Whether docker is expected to be available on this host.
    pub docker_expected: bool,
}

impl Default for FlagPolicy {
    fn default() -> Self {
        Self {
            cpu: Thresholds::new(70.0, 90.0),
            ram: Thresholds::new(70.0, 90.0),
            disk: Thresholds::new(80.0, 90.0),
            inode: Thresholds::new(80.0, 90.0),
            net_latency: Thresholds::new(150.0, 500.0),
            active_tcp: Thresholds::new(200.0, 500.0),
            swap_critical_pct: 80.0,
            starvation_available_pct: 5.0,
            disk_free_floor_bytes: 5 * 1024 * 1024 * 1024,
            disk_io_bps_critical: 100.0 * 1024.0 * 1024.0,
            container_oom_pct: 95.0,
            thermal_critical_fallback_c: 90.0,
            docker_expected: true,
        }
    }
}

// Cause domains in tie-break order; lower index wins when several domains
// raise critical flags.
const DOMAIN_DISK_SPACE: usize = 0;
const DOMAIN_MEMORY: usize = 1;
const DOMAIN_CPU: usize = 2;
const DOMAIN_DISK_IO: usize = 3;
const DOMAIN_NETWORK: usize = 4;
const DOMAIN_THERMAL: usize = 5;
const DOMAIN_DOCKER: usize = 6;

const DOMAIN_CAUSES: [PrimaryCause; 7] = [
    PrimaryCause::Disk,
    PrimaryCause::Memory,
    PrimaryCause::Cpu,
    PrimaryCause::Disk,
    PrimaryCause::Network,
    PrimaryCause::Thermal,
    PrimaryCause::Docker,
];

#[derive(Default)]
struct Attribution {
    domains: [Option<(CauseEntityType, String)>; 7],
}

impl Attribution {
    /// First registration per domain wins; an entity-less registration is
    /// upgraded when a per-entity check later names the culprit.
    fn register(&mut self, domain: usize, entity: CauseEntityType, key: &str) {
        match &self.domains[domain] {
            None => self.domains[domain] = Some((entity, key.to_string())),
            Some((CauseEntityType::None, _)) if entity != CauseEntityType::None => {
                self.domains[domain] = Some((entity, key.to_string()));
            }
            Some(_) => {}
        }
    }

    fn primary(&self) -> (PrimaryCause, CauseEntityType, String) {
        for (domain, slot) in self.domains.iter().enumerate() {
            if let Some((entity, key)) = slot {
                return (DOMAIN_CAUSES[domain], *entity, key.clone());
            }
        }
        (PrimaryCause::None, CauseEntityType::None, String::new())
    }
}

// Root usage and inode percentages are carried as snapshot scalars, so the
// partition loops skip root for the percentage checks to avoid reporting the
// same mount twice. The absolute free-space floor has no scalar counterpart
// and must include root.
fn is_root(p: &PartitionUsage) -> bool {
    p.mountpoint == "/"
}

/// Evaluate the flagging policy against one snapshot. Pure: no I/O, no time
/// lookup beyond the snapshot itself. `prev_docker_available` carries the
/// prior tick's docker availability for the transition-sensitive check.
pub fn flag(
    s: &NormalizedSnapshot,
    d: &DerivedRates,
    policy: &FlagPolicy,
    prev_docker_available: Option<bool>,
) -> SnapshotFlags {
    let mut f = SnapshotFlags::default();
    let mut reasons: Vec<(u8, String)> = Vec::new();
    let mut attr = Attribution::default();

    // CPU
    if s.cpu_usage_pct > policy.cpu.critical {
        f.cpu_overloaded = true;
        reasons.push((SEV_CRIT, format!("CPU critical: {:.1}%", s.cpu_usage_pct)));
        attr.register(DOMAIN_CPU, CauseEntityType::None, "");
    } else if s.cpu_usage_pct > policy.cpu.warning {
        reasons.push((SEV_WARN, format!("CPU warning: {:.1}%", s.cpu_usage_pct)));
    }

    // Memory
    if s.ram_usage_pct > policy.ram.critical {
        f.memory_pressure = true;
        reasons.push((SEV_CRIT, format!("RAM critical: {:.1}%", s.ram_usage_pct)));
        attr.register(DOMAIN_MEMORY, CauseEntityType::None, "");

        if s.ram_total_bytes > 0 {
            let available_pct =
                s.ram_available_bytes as f64 / s.ram_total_bytes as f64 * 100.0;
            if available_pct < policy.starvation_available_pct {
                f.memory_starvation = true;
                reasons.push((
                    SEV_CRIT,
                    format!("Memory starvation: {:.1}% available", available_pct),
                ));
            }
        }
    } else if s.ram_usage_pct > policy.ram.warning {
        reasons.push((SEV_WARN, format!("RAM warning: {:.1}%", s.ram_usage_pct)));
    }

    if s.swap_usage_pct > policy.swap_critical_pct && s.swap_used_bytes > 0 {
        f.swap_thrashing = true;
        reasons.push((
            SEV_CRIT,
            format!("Swap thrashing: {:.1}% used", s.swap_usage_pct),
        ));
        attr.register(DOMAIN_MEMORY, CauseEntityType::None, "");
    }

    // Disk space, root filesystem then every other partition
    if s.disk_usage_pct > policy.disk.critical {
        f.disk_space_critical = true;
        reasons.push((
            SEV_CRIT,
            format!("Disk critical: {:.1}% on /", s.disk_usage_pct),
        ));
        attr.register(DOMAIN_DISK_SPACE, CauseEntityType::Mount, "/");
    } else if s.disk_usage_pct > policy.disk.warning {
        reasons.push((
            SEV_WARN,
            format!("Disk warning: {:.1}% on /", s.disk_usage_pct),
        ));
    }
    for p in &s.partitions {
        let under_floor = p.total_bytes > 0 && p.available_bytes < policy.disk_free_floor_bytes;
        let over_pct = !is_root(p) && p.used_pct > policy.disk.critical;
        if over_pct || under_floor {
            f.disk_space_critical = true;
            let reason = if over_pct {
                format!("Disk critical: {:.1}% on {}", p.used_pct, p.mountpoint)
            } else {
                format!(
                    "Disk critical: {:.1} GiB free on {}",
                    p.available_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
                    p.mountpoint
                )
            };
            reasons.push((SEV_CRIT, reason));
            attr.register(DOMAIN_DISK_SPACE, CauseEntityType::Mount, &p.mountpoint);
        }
    }

    // Inodes, only on mounts with known totals
    if s.inode_total > 0 && s.inode_usage_pct > policy.inode.critical {
        f.inode_exhaustion = true;
        reasons.push((
            SEV_CRIT,
            format!("Inode critical: {:.1}% on /", s.inode_usage_pct),
        ));
        attr.register(DOMAIN_DISK_SPACE, CauseEntityType::Mount, "/");
    }
    for p in s.partitions.iter().filter(|p| !is_root(p)) {
        if p.inode_total > 0 && p.inode_usage_pct > policy.inode.critical {
            f.inode_exhaustion = true;
            reasons.push((
                SEV_CRIT,
                format!("Inode critical: {:.1}% on {}", p.inode_usage_pct, p.mountpoint),
            ));
            attr.register(DOMAIN_DISK_SPACE, CauseEntityType::Mount, &p.mountpoint);
        }
    }

    // Disk IO saturation (instantaneous rate check)
    if d.disk_read_bps > policy.disk_io_bps_critical
        || d.disk_write_bps > policy.disk_io_bps_critical
    {
        f.disk_io_saturation = true;
        reasons.push((
            SEV_CRIT,
            format!(
                "Disk IO saturation: {:.0}/{:.0} MB/s",
                d.disk_read_bps / 1e6,
                d.disk_write_bps / 1e6
            ),
        ));
        let busiest = s
            .io_counters
            .iter()
            .max_by_key(|io| io.read_bytes + io.write_bytes);
        match busiest {
            Some(io) => attr.register(DOMAIN_DISK_IO, CauseEntityType::Disk, &io.device),
            None => attr.register(DOMAIN_DISK_IO, CauseEntityType::None, ""),
        }
    }

    // Disk health
    for h in &s.disk_health {
        if h.status == DiskHealthStatus::Failed {
            f.disk_health_failed = true;
            reasons.push((SEV_CRIT, format!("Disk health failed: {}", h.device)));
            attr.register(DOMAIN_DISK_IO, CauseEntityType::Disk, &h.device);
        }
    }

    // Network
    if !s.is_connected {
        f.host_offline = true;
        reasons.push((SEV_FATAL, "Host offline: connectivity probe unreachable".into()));
        attr.register(DOMAIN_NETWORK, CauseEntityType::None, "");
    } else if s.net_latency_ms > policy.net_latency.critical {
        f.network_latency_degraded = true;
        reasons.push((
            SEV_CRIT,
            format!("High latency: {:.1}ms", s.net_latency_ms),
        ));
        attr.register(DOMAIN_NETWORK, CauseEntityType::None, "");
    } else if s.net_latency_ms > policy.net_latency.warning {
        reasons.push((
            SEV_WARN,
            format!("Latency warning: {:.1}ms", s.net_latency_ms),
        ));
    }

    if d.net_drop_per_s > 0.0 {
        f.network_packet_loss = true;
        reasons.push((
            SEV_WARN,
            format!("Packet loss: {:.2} drops/s", d.net_drop_per_s),
        ));
    }
    if d.net_err_per_s > 0.0 {
        f.network_interface_errors = true;
        reasons.push((
            SEV_WARN,
            format!("Interface errors: {:.2}/s", d.net_err_per_s),
        ));
    }

    let tcp = s.active_tcp as f64;
    if tcp > policy.active_tcp.critical {
        reasons.push((SEV_CRIT, format!("Active TCP critical: {}", s.active_tcp)));
        attr.register(DOMAIN_NETWORK, CauseEntityType::None, "");
    } else if tcp > policy.active_tcp.warning {
        reasons.push((SEV_WARN, format!("Active TCP warning: {}", s.active_tcp)));
    }

    // Docker: transition-sensitive, falling back to the configured expectation
    // when no prior tick is known.
    if !s.docker_available && prev_docker_available.unwrap_or(policy.docker_expected) {
        f.docker_unavailable = true;
        reasons.push((SEV_CRIT, "Docker unavailable".into()));
        attr.register(DOMAIN_DOCKER, CauseEntityType::None, "");
    }

    // Containers
    for c in &s.containers {
        if c.cpu_usage_pct > policy.cpu.critical {
            if !f.container_cpu_hog {
                reasons.push((
                    SEV_CRIT,
                    format!("Container CPU hog: {} at {:.1}%", c.name, c.cpu_usage_pct),
                ));
            }
            f.container_cpu_hog = true;
            attr.register(DOMAIN_CPU, CauseEntityType::Container, &c.id);
        }
        if c.mem_pct > policy.ram.critical {
            if !f.container_memory_pressure {
                reasons.push((
                    SEV_CRIT,
                    format!("Container memory pressure: {} at {:.1}%", c.name, c.mem_pct),
                ));
            }
            f.container_memory_pressure = true;
            attr.register(DOMAIN_MEMORY, CauseEntityType::Container, &c.id);
        }
        if c.mem_pct > policy.container_oom_pct {
            if !f.container_oom_risk {
                reasons.push((
                    SEV_CRIT,
                    format!("Container OOM risk: {} at {:.1}%", c.name, c.mem_pct),
                ));
            }
            f.container_oom_risk = true;
            attr.register(DOMAIN_MEMORY, CauseEntityType::Container, &c.id);
        }
    }

    // Top processes
    for p in &s.top_processes {
        if p.cpu_pct > policy.cpu.critical {
            if !f.runaway_process_cpu {
                reasons.push((
                    SEV_CRIT,
                    format!("Runaway process CPU: {} at {:.1}%", p.name, p.cpu_pct),
                ));
            }
            f.runaway_process_cpu = true;
            attr.register(DOMAIN_CPU, CauseEntityType::Process, &p.name);
        }
        if p.mem_pct > policy.ram.critical {
            if !f.runaway_process_memory {
                reasons.push((
                    SEV_CRIT,
                    format!("Runaway process memory: {} at {:.1}%", p.name, p.mem_pct),
                ));
            }
            f.runaway_process_memory = true;
            attr.register(DOMAIN_MEMORY, CauseEntityType::Process, &p.name);
        }
    }

    // Thermal
    for t in &s.temperatures {
        let critical = t.critical_c.unwrap_or(policy.thermal_critical_fallback_c);
        if t.temperature_c > critical {
            if !f.thermal_pressure {
                reasons.push((
                    SEV_CRIT,
                    format!("Thermal pressure: {} at {:.1}C", t.sensor_key, t.temperature_c),
                ));
            }
            f.thermal_pressure = true;
            attr.register(DOMAIN_THERMAL, CauseEntityType::Sensor, &t.sensor_key);
        }
    }

    // Aggregate
    f.severity_level = reasons.iter().map(|(sev, _)| *sev).max().unwrap_or(0);
    f.system_at_risk = f.severity_level >= SEV_CRIT;
    f.risk_score = if f.host_offline {
        100
    } else {
        (f.severity_level as u32 * 20).min(100) as u8
    };

    let (primary_cause, cause_entity_type, cause_entity_key) = attr.primary();
    f.primary_cause = primary_cause;
    f.cause_entity_type = cause_entity_type;
    f.cause_entity_key = cause_entity_key;

    // Human-readable summary: the three most severe reasons.
    reasons.sort_by(|a, b| b.0.cmp(&a.0));
    f.explanation = reasons
        .iter()
        .take(3)
        .map(|(_, text)| text.as_str())
        .collect::<Vec<_>>()
        .join("; ");

    f
}
