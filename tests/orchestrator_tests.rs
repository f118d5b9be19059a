// Live orchestrator tests against the real sensors of the build machine.
// Assertions stick to invariants that hold on any host.

use hostwatch::config::CollectorConfig;
use hostwatch::orchestrator::SensorOrchestrator;

fn quiet_config() -> CollectorConfig {
    CollectorConfig {
        docker_enabled: false,
        disk_health_enabled: false,
        thermal_enabled: false,
        probe_endpoint: "127.0.0.1:9".into(),
        probe_timeout: std::time::Duration::from_millis(250),
        ..Default::default()
    }
}

#[tokio::test]
async fn fast_tier_produces_bounded_percentages() {
    let orchestrator = SensorOrchestrator::new(&quiet_config());
    let raw = orchestrator.collect_fast().await.expect("fast tier");

    assert!((0.0..=100.0).contains(&raw.cpu_usage_pct));
    for core in &raw.cpu_per_core_pct {
        assert!((0.0..=100.0).contains(core), "core usage {}", core);
    }
    assert!(raw.ram_total_bytes > 0);
    assert!((0.0..=100.0).contains(&raw.ram_usage_pct));
    assert!(raw.ram_available_bytes <= raw.ram_total_bytes);
    for p in &raw.partitions {
        assert!((0.0..=100.0).contains(&p.used_pct), "{}", p.mountpoint);
        assert!((0.0..=100.0).contains(&p.inode_usage_pct));
    }

    // Slow-tier fields keep their sentinel until that tier runs.
    assert!(raw.is_connected);
    assert_eq!(raw.net_latency_ms, 0.0);
    assert!(raw.hostname.is_empty());
    assert!(raw.disk_health.is_empty());
}

#[tokio::test]
async fn fast_tier_without_docker_reports_it_unavailable() {
    let orchestrator = SensorOrchestrator::new(&quiet_config());
    let raw = orchestrator.collect_fast().await.expect("fast tier");
    assert!(!raw.docker_available);
    assert!(raw.containers.is_empty());
}

#[tokio::test]
async fn slow_tier_degrades_instead_of_failing() {
    // Probe points at a closed local port; the tier must still succeed.
    let orchestrator = SensorOrchestrator::new(&quiet_config());
    let raw = orchestrator.collect_slow().await.expect("slow tier");

    assert!(raw.net_latency_ms >= 0.0);
    assert!(raw.temperatures.is_empty(), "thermal disabled by config");
    assert!(raw.disk_health.is_empty(), "disk health disabled by config");
}

#[tokio::test]
async fn top_process_limit_is_honored() {
    let config = CollectorConfig {
        top_process_count: 3,
        ..quiet_config()
    };
    let orchestrator = SensorOrchestrator::new(&config);
    let raw = orchestrator.collect_fast().await.expect("fast tier");
    assert!(raw.processes.len() <= 3);
}
