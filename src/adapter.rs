// Lossless projection of a raw snapshot into the canonical normalized form.

use chrono::{DateTime, Utc};

use crate::models::{HostIdentity, NormalizedSnapshot, RawSnapshot, SnapshotKind, TopProcess};

/// Normalize with `collected_at` stamped now. The stamp happens here, before
/// any persistence begins, so commit order and timestamp order agree.
pub fn normalize(
    raw: &RawSnapshot,
    kind: SnapshotKind,
    identity: &HostIdentity,
) -> NormalizedSnapshot {
    normalize_at(raw, kind, identity, Utc::now())
}

/// Normalize against an explicit timestamp.
pub fn normalize_at(
    raw: &RawSnapshot,
    kind: SnapshotKind,
    identity: &HostIdentity,
    collected_at: DateTime<Utc>,
) -> NormalizedSnapshot {
    let machine_id = if identity.machine_id.is_empty() {
        raw.machine_id.clone()
    } else {
        identity.machine_id.clone()
    };
    let boot_id = if identity.boot_id.is_empty() {
        raw.boot_id.clone()
    } else {
        identity.boot_id.clone()
    };

    let top_processes = raw
        .processes
        .iter()
        .enumerate()
        .map(|(i, p)| TopProcess {
            rank: i as u32 + 1,
            pid: p.pid,
            name: p.name.clone(),
            cpu_pct: p.cpu_pct,
            mem_pct: clamp_pct(p.mem_pct),
        })
        .collect();

    NormalizedSnapshot {
        collected_at,
        kind,
        agent_id: identity.agent_id.clone(),
        machine_id,
        boot_id,
        hostname: raw.hostname.clone(),

        cpu_usage_pct: clamp_pct(raw.cpu_usage_pct),
        cpu_per_core_pct: raw.cpu_per_core_pct.iter().map(|p| clamp_pct(*p)).collect(),
        cpu_model: raw.cpu_model.clone(),
        cpu_cores_logical: raw.cpu_cores_logical,
        load: raw.load,

        ram_usage_pct: clamp_pct(raw.ram_usage_pct),
        ram_total_bytes: raw.ram_total_bytes,
        ram_available_bytes: raw.ram_available_bytes,
        ram_used_bytes: raw.ram_used_bytes,
        ram_free_bytes: raw.ram_free_bytes,
        ram_cached_bytes: raw.ram_cached_bytes,
        ram_buffered_bytes: raw.ram_buffered_bytes,
        swap_usage_pct: clamp_pct(raw.swap_usage_pct),
        swap_total_bytes: raw.swap_total_bytes,
        swap_used_bytes: raw.swap_used_bytes,

        disk_usage_pct: clamp_pct(raw.disk_usage_pct),
        disk_total_bytes: raw.disk_total_bytes,
        inode_usage_pct: clamp_pct(raw.inode_usage_pct),
        inode_total: raw.inode_total,
        partitions: raw.partitions.clone(),
        io_counters: raw.io_counters.clone(),
        disk_health: raw.disk_health.clone(),

        net_latency_ms: raw.net_latency_ms.max(0.0),
        is_connected: raw.is_connected,
        active_tcp: raw.active_tcp,
        net_interfaces: raw.net_interfaces.clone(),

        docker_available: raw.docker_available,
        containers: raw.containers.clone(),

        os: raw.os.clone(),
        platform: raw.platform.clone(),
        kernel_version: raw.kernel_version.clone(),
        uptime_secs: raw.uptime_secs,
        process_count: raw.process_count,

        temperatures: raw.temperatures.clone(),
        top_processes,
    }
}

fn clamp_pct(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 100.0) } else { 0.0 }
}
