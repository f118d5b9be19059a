// Config tests: defaults, overrides, validation failures.

use std::collections::HashMap;
use std::time::Duration;

use hostwatch::config::{AppConfig, TOP_PROCESS_HARD_CAP};

fn base_env() -> HashMap<String, String> {
    HashMap::from([("HOSTWATCH_AGENT_ID".to_string(), "agent-1".to_string())])
}

#[test]
fn defaults_match_the_documented_values() {
    let config = AppConfig::from_env_map(&base_env()).unwrap();
    assert_eq!(config.agent_id, "agent-1");
    assert_eq!(config.database_path, "hostwatch.db");

    let c = &config.collector;
    assert_eq!(c.fast_timeout, Duration::from_secs(2));
    assert_eq!(c.slow_timeout, Duration::from_secs(25));
    assert_eq!(c.fast_poll_interval, Duration::from_secs(1));
    assert_eq!(c.slow_poll_interval, Duration::from_secs(30));
    assert_eq!(c.graph_deadline, Duration::from_secs(30));
    assert_eq!(c.probe_endpoint, "8.8.8.8:53");
    assert_eq!(c.top_process_count, 10);
    assert_eq!(c.max_console_logs, 100);
    assert!(c.docker_enabled);
    assert!(c.disk_health_enabled);
    assert!(c.thermal_enabled);

    assert_eq!(config.policy.cpu.warning, 70.0);
    assert_eq!(config.policy.cpu.critical, 90.0);
    assert_eq!(config.policy.disk.warning, 80.0);
    assert_eq!(config.policy.net_latency.critical, 500.0);
    assert_eq!(config.policy.active_tcp.warning, 200.0);
    assert!(config.policy.docker_expected);
    assert!(config.graph.is_none());
}

#[test]
fn missing_agent_id_is_fatal() {
    let err = AppConfig::from_env_map(&HashMap::new()).unwrap_err();
    assert!(err.to_string().contains("HOSTWATCH_AGENT_ID"));
}

#[test]
fn overrides_are_parsed() {
    let mut env = base_env();
    env.insert("HOSTWATCH_FAST_TIMEOUT_MS".into(), "500".into());
    env.insert("HOSTWATCH_PROBE_ENDPOINT".into(), "1.1.1.1:53".into());
    env.insert("HOSTWATCH_DOCKER_ENABLED".into(), "false".into());
    env.insert("HOSTWATCH_CPU_CRIT".into(), "95".into());
    env.insert("HOSTWATCH_TOP_PROCESS_COUNT".into(), "20".into());

    let config = AppConfig::from_env_map(&env).unwrap();
    assert_eq!(config.collector.fast_timeout, Duration::from_millis(500));
    assert_eq!(config.collector.probe_endpoint, "1.1.1.1:53");
    assert!(!config.collector.docker_enabled);
    // Docker expectation follows the sensor toggle.
    assert!(!config.policy.docker_expected);
    assert_eq!(config.policy.cpu.critical, 95.0);
    assert_eq!(config.collector.top_process_count, 20);
}

#[test]
fn top_process_count_is_capped() {
    let mut env = base_env();
    env.insert("HOSTWATCH_TOP_PROCESS_COUNT".into(), "500".into());
    let config = AppConfig::from_env_map(&env).unwrap();
    assert_eq!(config.collector.top_process_count, TOP_PROCESS_HARD_CAP);
}

#[test]
fn unparsable_numbers_are_rejected_with_the_variable_name() {
    let mut env = base_env();
    env.insert("HOSTWATCH_SLOW_TIMEOUT_MS".into(), "soon".into());
    let err = AppConfig::from_env_map(&env).unwrap_err();
    assert!(format!("{:#}", err).contains("HOSTWATCH_SLOW_TIMEOUT_MS"));
}

#[test]
fn inverted_thresholds_are_rejected() {
    let mut env = base_env();
    env.insert("HOSTWATCH_RAM_WARN".into(), "95".into());
    env.insert("HOSTWATCH_RAM_CRIT".into(), "90".into());
    let err = AppConfig::from_env_map(&env).unwrap_err();
    assert!(err.to_string().contains("HOSTWATCH_RAM"));
}

#[test]
fn endpoint_without_a_port_is_rejected() {
    let mut env = base_env();
    env.insert("HOSTWATCH_PROBE_ENDPOINT".into(), "dns.google".into());
    assert!(AppConfig::from_env_map(&env).is_err());
}

#[test]
fn zero_intervals_are_rejected() {
    let mut env = base_env();
    env.insert("HOSTWATCH_FAST_POLL_INTERVAL_MS".into(), "0".into());
    assert!(AppConfig::from_env_map(&env).is_err());
}

#[test]
fn graph_settings_require_only_the_uri() {
    let mut env = base_env();
    env.insert(
        "HOSTWATCH_NEO4J_URI".into(),
        "bolt://localhost:7687".into(),
    );
    let config = AppConfig::from_env_map(&env).unwrap();
    let graph = config.graph.expect("graph settings");
    assert_eq!(graph.uri, "bolt://localhost:7687");
    assert_eq!(graph.user, "neo4j");
    assert_eq!(graph.database, "neo4j");
}

#[test]
fn identity_carries_the_configured_overrides() {
    let mut env = base_env();
    env.insert("HOSTWATCH_MACHINE_ID".into(), "m-override".into());
    let config = AppConfig::from_env_map(&env).unwrap();
    let id = config.identity();
    assert_eq!(id.agent_id, "agent-1");
    assert_eq!(id.machine_id, "m-override");
    assert!(id.boot_id.is_empty());
}
