// Adapter tests: identity resolution, ranking, clamping, serde round-trip.

mod common;

use common::{healthy_raw, identity, ts};
use hostwatch::adapter::normalize_at;
use hostwatch::models::{HostIdentity, ProcessSample, SnapshotKind};

#[test]
fn processes_are_ranked_from_one() {
    let mut raw = healthy_raw();
    raw.processes = vec![
        ProcessSample {
            pid: 10,
            name: "postgres".into(),
            cpu_pct: 40.0,
            mem_pct: 20.0,
        },
        ProcessSample {
            pid: 11,
            name: "nginx".into(),
            cpu_pct: 5.0,
            mem_pct: 2.0,
        },
    ];

    let s = normalize_at(&raw, SnapshotKind::Merged, &identity("a"), ts(1_700_000_000));
    assert_eq!(s.top_processes.len(), 2);
    assert_eq!(s.top_processes[0].rank, 1);
    assert_eq!(s.top_processes[0].name, "postgres");
    assert_eq!(s.top_processes[1].rank, 2);
}

#[test]
fn configured_identity_overrides_observed_identity() {
    let raw = healthy_raw();
    let configured = HostIdentity {
        agent_id: "agent-42".into(),
        machine_id: "configured-machine".into(),
        boot_id: String::new(),
    };

    let s = normalize_at(&raw, SnapshotKind::Merged, &configured, ts(1_700_000_000));
    assert_eq!(s.agent_id, "agent-42");
    assert_eq!(s.machine_id, "configured-machine");
    // Empty override falls back to what the host sensor observed.
    assert_eq!(s.boot_id, "boot-1");
    assert_eq!(s.hostname, "testhost");
}

#[test]
fn kind_and_timestamp_are_stamped() {
    let raw = healthy_raw();
    let at = ts(1_700_000_123);
    let s = normalize_at(&raw, SnapshotKind::Fast, &identity("a"), at);
    assert_eq!(s.kind, SnapshotKind::Fast);
    assert_eq!(s.collected_at, at);
}

#[test]
fn percentages_are_clamped_into_range() {
    let mut raw = healthy_raw();
    raw.cpu_usage_pct = 140.0;
    raw.ram_usage_pct = -3.0;
    raw.swap_usage_pct = f64::NAN;
    raw.cpu_per_core_pct = vec![250.0, -1.0, 50.0];

    let s = normalize_at(&raw, SnapshotKind::Merged, &identity("a"), ts(1_700_000_000));
    assert_eq!(s.cpu_usage_pct, 100.0);
    assert_eq!(s.ram_usage_pct, 0.0);
    assert_eq!(s.swap_usage_pct, 0.0);
    assert_eq!(s.cpu_per_core_pct, vec![100.0, 0.0, 50.0]);
}

#[test]
fn normalized_snapshot_round_trips_byte_identical() {
    let raw = healthy_raw();
    let s = normalize_at(&raw, SnapshotKind::Merged, &identity("a"), ts(1_700_000_000));

    let first = serde_json::to_string(&s).unwrap();
    let reparsed: hostwatch::models::NormalizedSnapshot = serde_json::from_str(&first).unwrap();
    let second = serde_json::to_string(&reparsed).unwrap();
    assert_eq!(first, second);
}

#[test]
fn collections_stay_concrete_when_empty() {
    let raw = hostwatch::models::RawSnapshot::default();
    let s = normalize_at(&raw, SnapshotKind::Merged, &identity("a"), ts(1_700_000_000));
    assert!(s.partitions.is_empty());
    assert!(s.containers.is_empty());
    assert!(s.top_processes.is_empty());
    // Serialized form carries empty arrays, not nulls.
    let json = serde_json::to_value(&s).unwrap();
    assert!(json["partitions"].is_array());
    assert!(json["containers"].is_array());
}
