// Flagger tests: healthy baseline, threshold flags, severity/risk bounds,
// cause tie-breaking, docker transition sensitivity.

mod common;

use common::{healthy_snapshot, ts};
use hostwatch::flagger::{FlagPolicy, flag};
use hostwatch::models::{
    CauseEntityType, ContainerStat, DerivedRates, PrimaryCause, TemperatureReading, TopProcess,
};

#[test]
fn healthy_host_raises_nothing() {
    let s = healthy_snapshot("agent-1", ts(1_700_000_000));
    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);

    assert_eq!(f.severity_level, 0);
    assert_eq!(f.risk_score, 0);
    assert_eq!(f.bitmask(), 0);
    assert!(f.triggered().is_empty());
    assert_eq!(f.primary_cause, PrimaryCause::None);
    assert_eq!(f.cause_entity_type, CauseEntityType::None);
    assert!(f.explanation.is_empty());
}

#[test]
fn disk_critical_attributes_the_root_mount() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.disk_usage_pct = 92.0;
    s.partitions[0].used_pct = 92.0;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.disk_space_critical);
    assert!(f.system_at_risk);
    assert_eq!(f.severity_level, 3);
    assert_eq!(f.risk_score, 60);
    assert_eq!(f.primary_cause, PrimaryCause::Disk);
    assert_eq!(f.cause_entity_type, CauseEntityType::Mount);
    assert_eq!(f.cause_entity_key, "/");
}

#[test]
fn partition_under_absolute_floor_is_critical_regardless_of_percent() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.partitions.push(hostwatch::models::PartitionUsage {
        mountpoint: "/var/log".into(),
        device: "/dev/sdb1".into(),
        fstype: "ext4".into(),
        used_pct: 50.0,
        total_bytes: 10_000_000_000,
        available_bytes: 1_000_000_000, // under the 5 GiB floor
        inode_usage_pct: 5.0,
        inode_total: 100_000,
    });

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.disk_space_critical);
    assert_eq!(f.cause_entity_key, "/var/log");
}

#[test]
fn root_under_absolute_floor_is_critical_regardless_of_percent() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    // A small disk: half used, but only 2 GiB left.
    s.disk_usage_pct = 50.0;
    s.disk_total_bytes = 4 * 1024 * 1024 * 1024;
    s.partitions[0].used_pct = 50.0;
    s.partitions[0].total_bytes = 4 * 1024 * 1024 * 1024;
    s.partitions[0].available_bytes = 2 * 1024 * 1024 * 1024;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.disk_space_critical);
    assert_eq!(f.severity_level, 3);
    assert_eq!(f.risk_score, 60);
    assert_eq!(f.primary_cause, PrimaryCause::Disk);
    assert_eq!(f.cause_entity_type, CauseEntityType::Mount);
    assert_eq!(f.cause_entity_key, "/");
    assert!(f.explanation.contains("GiB free on /"));
}

#[test]
fn offline_host_is_fatal() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.is_connected = false;
    s.net_latency_ms = 0.0;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.host_offline);
    assert_eq!(f.severity_level, 4);
    assert_eq!(f.risk_score, 100);
    assert_eq!(f.primary_cause, PrimaryCause::Network);
    assert!(f.system_at_risk);
}

#[test]
fn memory_wins_the_tie_break_over_cpu() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.cpu_usage_pct = 95.0;
    s.ram_usage_pct = 95.0;
    s.disk_usage_pct = 50.0;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.cpu_overloaded);
    assert!(f.memory_pressure);
    assert_eq!(f.severity_level, 3);
    assert_eq!(f.primary_cause, PrimaryCause::Memory);
}

#[test]
fn disk_wins_the_tie_break_over_memory() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.disk_usage_pct = 95.0;
    s.ram_usage_pct = 95.0;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert_eq!(f.primary_cause, PrimaryCause::Disk);
}

#[test]
fn docker_unavailability_follows_expectation_and_transitions() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.docker_available = false;
    let policy = FlagPolicy::default();

    // No prior tick: configuration decides.
    assert!(flag(&s, &DerivedRates::default(), &policy, None).docker_unavailable);
    let relaxed = FlagPolicy {
        docker_expected: false,
        ..FlagPolicy::default()
    };
    assert!(!flag(&s, &DerivedRates::default(), &relaxed, None).docker_unavailable);

    // Transition-sensitive: only an available -> unavailable edge raises.
    assert!(flag(&s, &DerivedRates::default(), &relaxed, Some(true)).docker_unavailable);
    assert!(!flag(&s, &DerivedRates::default(), &policy, Some(false)).docker_unavailable);
}

#[test]
fn container_hog_names_the_container() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.containers.push(ContainerStat {
        id: "cafe01".into(),
        name: "worker".into(),
        image: "worker:latest".into(),
        status: "Up 2 hours".into(),
        running: true,
        cpu_usage_pct: 97.0,
        mem_usage_bytes: 100,
        mem_limit_bytes: 1_000,
        mem_pct: 10.0,
    });

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.container_cpu_hog);
    assert_eq!(f.primary_cause, PrimaryCause::Cpu);
    assert_eq!(f.cause_entity_type, CauseEntityType::Container);
    assert_eq!(f.cause_entity_key, "cafe01");
}

#[test]
fn container_near_its_limit_raises_oom_risk() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.containers.push(ContainerStat {
        id: "beef02".into(),
        name: "db".into(),
        image: "db:16".into(),
        status: "Up 1 hour".into(),
        running: true,
        cpu_usage_pct: 5.0,
        mem_usage_bytes: 990,
        mem_limit_bytes: 1_000,
        mem_pct: 99.0,
    });

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.container_memory_pressure);
    assert!(f.container_oom_risk);
    assert_eq!(f.primary_cause, PrimaryCause::Memory);
}

#[test]
fn runaway_process_names_the_process() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.top_processes.push(TopProcess {
        rank: 1,
        pid: 4242,
        name: "chrome".into(),
        cpu_pct: 10.0,
        mem_pct: 93.0,
    });

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.runaway_process_memory);
    assert_eq!(f.primary_cause, PrimaryCause::Memory);
    assert_eq!(f.cause_entity_type, CauseEntityType::Process);
    assert_eq!(f.cause_entity_key, "chrome");
}

#[test]
fn thermal_pressure_uses_sensor_thresholds() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.temperatures.push(TemperatureReading {
        sensor_key: "coretemp Package id 0".into(),
        temperature_c: 95.0,
        critical_c: None, // falls back to the policy default of 90
    });

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.thermal_pressure);
    assert_eq!(f.primary_cause, PrimaryCause::Thermal);
    assert_eq!(f.cause_entity_type, CauseEntityType::Sensor);

    // A sensor-reported critical above the reading keeps the flag down.
    s.temperatures[0].critical_c = Some(100.0);
    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(!f.thermal_pressure);
}

#[test]
fn latency_over_critical_degrades_the_network() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.net_latency_ms = 600.0;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert!(f.network_latency_degraded);
    assert_eq!(f.severity_level, 3);
    assert_eq!(f.primary_cause, PrimaryCause::Network);
}

#[test]
fn packet_loss_and_errors_warn_without_escalating() {
    let s = healthy_snapshot("agent-1", ts(1_700_000_000));
    let d = DerivedRates {
        net_drop_per_s: 0.5,
        net_err_per_s: 1.5,
        ..Default::default()
    };

    let f = flag(&s, &d, &FlagPolicy::default(), None);
    assert!(f.network_packet_loss);
    assert!(f.network_interface_errors);
    assert_eq!(f.severity_level, 2);
    assert_eq!(f.risk_score, 40);
    assert!(!f.system_at_risk);
    assert_eq!(f.primary_cause, PrimaryCause::None);
}

#[test]
fn disk_io_saturation_names_the_busiest_device() {
    let s = healthy_snapshot("agent-1", ts(1_700_000_000));
    let d = DerivedRates {
        disk_read_bps: 200.0 * 1024.0 * 1024.0,
        ..Default::default()
    };

    let f = flag(&s, &d, &FlagPolicy::default(), None);
    assert!(f.disk_io_saturation);
    assert_eq!(f.primary_cause, PrimaryCause::Disk);
    assert_eq!(f.cause_entity_type, CauseEntityType::Disk);
    assert_eq!(f.cause_entity_key, "sda");
}

#[test]
fn explanation_keeps_the_three_most_severe_reasons() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.cpu_usage_pct = 95.0;
    s.ram_usage_pct = 95.0;
    s.disk_usage_pct = 95.0;
    s.net_latency_ms = 600.0;
    s.is_connected = false;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), None);
    assert_eq!(f.explanation.split("; ").count(), 3);
    assert!(f.explanation.starts_with("Host offline"));
}

#[test]
fn severity_and_risk_stay_in_bounds() {
    let mut s = healthy_snapshot("agent-1", ts(1_700_000_000));
    s.cpu_usage_pct = 100.0;
    s.ram_usage_pct = 100.0;
    s.ram_available_bytes = 0;
    s.disk_usage_pct = 100.0;
    s.swap_usage_pct = 100.0;
    s.swap_used_bytes = 1;
    s.inode_usage_pct = 99.0;
    s.is_connected = false;
    s.docker_available = false;

    let f = flag(&s, &DerivedRates::default(), &FlagPolicy::default(), Some(true));
    assert!(f.severity_level <= 4);
    assert!(f.risk_score <= 100);
    assert!(f.memory_starvation);
    assert!(f.swap_thrashing);
    assert!(f.inode_exhaustion);
    let mask = f.bitmask();
    assert!(mask & 1 != 0, "host_offline is bit 0");
    assert!(mask & (1 << 19) != 0, "system_at_risk is bit 19");
}
