// Environment-driven configuration (HOSTWATCH_* variables) with defaults and
// validation. `from_env_map` exists so tests can exercise parsing without
// touching process environment.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result, ensure};

use crate::flagger::{FlagPolicy, Thresholds};
use crate::models::HostIdentity;

/// Upper bound on ranked processes per tick, regardless of configuration.
pub const TOP_PROCESS_HARD_CAP: usize = 50;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Required stable host identity (HOSTWATCH_AGENT_ID).
    pub agent_id: String,
    /// Optional identity overrides; the host sensor fills them otherwise.
    pub machine_id: String,
    pub boot_id: String,

    /// SQLite database path (HOSTWATCH_DB_PATH).
    pub database_path: String,

    pub collector: CollectorConfig,
    pub policy: FlagPolicy,
    /// Graph projection settings; None disables the projector entirely.
    pub graph: Option<GraphSettings>,
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub fast_timeout: Duration,
    pub slow_timeout: Duration,
    pub fast_poll_interval: Duration,
    pub slow_poll_interval: Duration,
    pub graph_deadline: Duration,

    pub probe_endpoint: String,
    pub probe_timeout: Duration,

    pub top_process_count: usize,
    /// Ring-buffer size for the UI log feed (consumed by the out-of-scope
    /// presentation layer).
    pub max_console_logs: usize,

    pub docker_enabled: bool,
    pub disk_health_enabled: bool,
    pub thermal_enabled: bool,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            fast_timeout: Duration::from_secs(2),
            slow_timeout: Duration::from_secs(25),
            fast_poll_interval: Duration::from_secs(1),
            slow_poll_interval: Duration::from_secs(30),
            graph_deadline: Duration::from_secs(30),
            probe_endpoint: "8.8.8.8:53".into(),
            probe_timeout: Duration::from_secs(3),
            top_process_count: 10,
            max_console_logs: 100,
            docker_enabled: true,
            disk_health_enabled: true,
            thermal_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_env_map(&vars)
    }

    pub fn from_env_map(vars: &HashMap<String, String>) -> Result<Self> {
        let text = |key: &str, default: &str| -> String {
            vars.get(key).cloned().unwrap_or_else(|| default.to_string())
        };

        let collector = CollectorConfig {
            fast_timeout: parse_ms(vars, "HOSTWATCH_FAST_TIMEOUT_MS", 2_000)?,
            slow_timeout: parse_ms(vars, "HOSTWATCH_SLOW_TIMEOUT_MS", 25_000)?,
            fast_poll_interval: parse_ms(vars, "HOSTWATCH_FAST_POLL_INTERVAL_MS", 1_000)?,
            slow_poll_interval: parse_ms(vars, "HOSTWATCH_SLOW_POLL_INTERVAL_MS", 30_000)?,
            graph_deadline: parse_ms(vars, "HOSTWATCH_GRAPH_DEADLINE_MS", 30_000)?,
            probe_endpoint: text("HOSTWATCH_PROBE_ENDPOINT", "8.8.8.8:53"),
            probe_timeout: parse_ms(vars, "HOSTWATCH_PROBE_TIMEOUT_MS", 3_000)?,
            top_process_count: parse_usize(vars, "HOSTWATCH_TOP_PROCESS_COUNT", 10)?
                .min(TOP_PROCESS_HARD_CAP),
            max_console_logs: parse_usize(vars, "HOSTWATCH_MAX_CONSOLE_LOGS", 100)?,
            docker_enabled: parse_bool(vars, "HOSTWATCH_DOCKER_ENABLED", true)?,
            disk_health_enabled: parse_bool(vars, "HOSTWATCH_DISK_HEALTH_ENABLED", true)?,
            thermal_enabled: parse_bool(vars, "HOSTWATCH_THERMAL_ENABLED", true)?,
        };

        let defaults = FlagPolicy::default();
        let policy = FlagPolicy {
            cpu: parse_thresholds(vars, "HOSTWATCH_CPU", defaults.cpu)?,
            ram: parse_thresholds(vars, "HOSTWATCH_RAM", defaults.ram)?,
            disk: parse_thresholds(vars, "HOSTWATCH_DISK", defaults.disk)?,
            inode: parse_thresholds(vars, "HOSTWATCH_INODE", defaults.inode)?,
            net_latency: parse_thresholds(vars, "HOSTWATCH_NET_LATENCY", defaults.net_latency)?,
            active_tcp: parse_thresholds(vars, "HOSTWATCH_ACTIVE_TCP", defaults.active_tcp)?,
            docker_expected: collector.docker_enabled,
            ..defaults
        };

        let graph = vars
            .get("HOSTWATCH_NEO4J_URI")
            .filter(|uri| !uri.is_empty())
            .map(|uri| GraphSettings {
                uri: uri.clone(),
                user: text("HOSTWATCH_NEO4J_USER", "neo4j"),
                password: text("HOSTWATCH_NEO4J_PASSWORD", ""),
                database: text("HOSTWATCH_NEO4J_DATABASE", "neo4j"),
            });

        let config = Self {
            agent_id: text("HOSTWATCH_AGENT_ID", ""),
            machine_id: text("HOSTWATCH_MACHINE_ID", ""),
            boot_id: text("HOSTWATCH_BOOT_ID", ""),
            database_path: text("HOSTWATCH_DB_PATH", "hostwatch.db"),
            collector,
            policy,
            graph,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn identity(&self) -> HostIdentity {
        HostIdentity {
            agent_id: self.agent_id.clone(),
            machine_id: self.machine_id.clone(),
            boot_id: self.boot_id.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.agent_id.is_empty(),
            "HOSTWATCH_AGENT_ID must be set to a non-empty stable id"
        );
        ensure!(
            !self.database_path.is_empty(),
            "HOSTWATCH_DB_PATH must be non-empty"
        );

        let c = &self.collector;
        ensure!(
            c.fast_timeout > Duration::ZERO,
            "HOSTWATCH_FAST_TIMEOUT_MS must be > 0"
        );
        ensure!(
            c.slow_timeout > Duration::ZERO,
            "HOSTWATCH_SLOW_TIMEOUT_MS must be > 0"
        );
        ensure!(
            c.fast_poll_interval > Duration::ZERO,
            "HOSTWATCH_FAST_POLL_INTERVAL_MS must be > 0"
        );
        ensure!(
            c.slow_poll_interval > Duration::ZERO,
            "HOSTWATCH_SLOW_POLL_INTERVAL_MS must be > 0"
        );
        ensure!(
            c.probe_endpoint.contains(':'),
            "HOSTWATCH_PROBE_ENDPOINT must be host:port, got {:?}",
            c.probe_endpoint
        );
        ensure!(
            c.top_process_count > 0,
            "HOSTWATCH_TOP_PROCESS_COUNT must be > 0"
        );

        for (name, t) in [
            ("HOSTWATCH_CPU", self.policy.cpu),
            ("HOSTWATCH_RAM", self.policy.ram),
            ("HOSTWATCH_DISK", self.policy.disk),
            ("HOSTWATCH_INODE", self.policy.inode),
            ("HOSTWATCH_NET_LATENCY", self.policy.net_latency),
            ("HOSTWATCH_ACTIVE_TCP", self.policy.active_tcp),
        ] {
            ensure!(
                t.warning < t.critical,
                "{}_WARN must be below {}_CRIT, got {} >= {}",
                name,
                name,
                t.warning,
                t.critical
            );
        }
        Ok(())
    }
}

fn parse_ms(vars: &HashMap<String, String>, key: &str, default_ms: u64) -> Result<Duration> {
    let ms = match vars.get(key) {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{} must be an integer millisecond count, got {:?}", key, raw))?,
        None => default_ms,
    };
    Ok(Duration::from_millis(ms))
}

fn parse_usize(vars: &HashMap<String, String>, key: &str, default: usize) -> Result<usize> {
    match vars.get(key) {
        Some(raw) => raw
            .parse::<usize>()
            .with_context(|| format!("{} must be a non-negative integer, got {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_f64(vars: &HashMap<String, String>, key: &str, default: f64) -> Result<f64> {
    match vars.get(key) {
        Some(raw) => raw
            .parse::<f64>()
            .with_context(|| format!("{} must be a number, got {:?}", key, raw)),
        None => Ok(default),
    }
}

fn parse_bool(vars: &HashMap<String, String>, key: &str, default: bool) -> Result<bool> {
    match vars.get(key).map(|s| s.to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if ["1", "true", "yes"].contains(&v.as_str()) => Ok(true),
        Some(v) if ["0", "false", "no"].contains(&v.as_str()) => Ok(false),
        Some(v) => anyhow::bail!("{} must be a boolean, got {:?}", key, v),
    }
}

fn parse_thresholds(
    vars: &HashMap<String, String>,
    prefix: &str,
    default: Thresholds,
) -> Result<Thresholds> {
    Ok(Thresholds::new(
        parse_f64(vars, &format!("{}_WARN", prefix), default.warning)?,
        parse_f64(vars, &format!("{}_CRIT", prefix), default.critical)?,
    ))
}
