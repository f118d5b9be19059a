// Shared test helpers

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use hostwatch::adapter;
use hostwatch::models::*;
use hostwatch::snapshot_repo::SnapshotRepo;
use tempfile::TempDir;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn identity(agent_id: &str) -> HostIdentity {
    HostIdentity {
        agent_id: agent_id.to_string(),
        machine_id: String::new(),
        boot_id: String::new(),
    }
}

/// A raw snapshot for a host with nothing wrong: low utilization, connected,
/// docker up with no containers, no temperature excursions.
pub fn healthy_raw() -> RawSnapshot {
    RawSnapshot {
        cpu_usage_pct: 5.0,
        cpu_per_core_pct: vec![4.0, 6.0],
        cpu_model: "Test CPU".into(),
        cpu_cores_logical: 2,
        load: LoadAverages {
            one: 0.2,
            five: 0.1,
            fifteen: 0.05,
        },

        ram_usage_pct: 30.0,
        ram_total_bytes: 16 * 1024 * 1024 * 1024,
        ram_available_bytes: 11 * 1024 * 1024 * 1024,
        ram_used_bytes: 5 * 1024 * 1024 * 1024,
        ram_free_bytes: 9 * 1024 * 1024 * 1024,
        ram_cached_bytes: 2 * 1024 * 1024 * 1024,
        ram_buffered_bytes: 512 * 1024 * 1024,
        swap_usage_pct: 0.0,
        swap_total_bytes: 4 * 1024 * 1024 * 1024,
        swap_used_bytes: 0,

        disk_usage_pct: 40.0,
        disk_total_bytes: 500_000_000_000,
        inode_usage_pct: 10.0,
        inode_total: 1_000_000,
        partitions: vec![PartitionUsage {
            mountpoint: "/".into(),
            device: "/dev/sda1".into(),
            fstype: "ext4".into(),
            used_pct: 40.0,
            total_bytes: 500_000_000_000,
            available_bytes: 300_000_000_000,
            inode_usage_pct: 10.0,
            inode_total: 1_000_000,
        }],
        io_counters: vec![DiskIoCounters {
            device: "sda".into(),
            read_bytes: 1_000_000,
            write_bytes: 2_000_000,
            read_count: 100,
            write_count: 200,
            read_time_ms: 50,
            write_time_ms: 80,
        }],

        net_latency_ms: 20.0,
        is_connected: true,
        active_tcp: 12,
        net_interfaces: vec![NetInterfaceCounters {
            name: "eth0".into(),
            bytes_sent: 10_000,
            bytes_recv: 20_000,
            packets_sent: 100,
            packets_recv: 150,
            err_in: 0,
            err_out: 0,
            drop_in: 0,
            drop_out: 0,
        }],

        docker_available: true,

        hostname: "testhost".into(),
        os: "Linux".into(),
        platform: "Test Linux 1.0".into(),
        kernel_version: "6.1.0".into(),
        uptime_secs: 3_600,
        process_count: 120,
        machine_id: "machine-1".into(),
        boot_id: "boot-1".into(),

        ..Default::default()
    }
}

pub fn healthy_snapshot(agent_id: &str, collected_at: DateTime<Utc>) -> NormalizedSnapshot {
    adapter::normalize_at(
        &healthy_raw(),
        SnapshotKind::Merged,
        &identity(agent_id),
        collected_at,
    )
}

pub async fn temp_repo() -> (TempDir, SnapshotRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshots.db");
    let repo = SnapshotRepo::connect(path.to_str().unwrap()).await.unwrap();
    repo.migrate().await.unwrap();
    (dir, repo)
}
