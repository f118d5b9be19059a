// Process a raw Docker stats API response into a ContainerStat.

use bollard::secret::ContainerStatsResponse;

use crate::models::ContainerStat;

/// CPU percent is computed from the delta between the current and previous
/// sample, scaled by online CPUs; None when the response carries no CPU
/// samples yet (first frame of a stream).
pub(super) fn process_statistics(
    s: &ContainerStatsResponse,
    id: &str,
    name: &str,
) -> Option<ContainerStat> {
    let cpu_stats = s.cpu_stats.as_ref()?;
    let precpu_stats = s.precpu_stats.as_ref()?;
    let cpu_usage = cpu_stats.cpu_usage.as_ref()?;
    let precpu_usage = precpu_stats.cpu_usage.as_ref()?;

    let cpu_delta =
        cpu_usage.total_usage.unwrap_or(0) as i64 - precpu_usage.total_usage.unwrap_or(0) as i64;
    let system_delta = cpu_stats.system_cpu_usage.unwrap_or(0) as i64
        - precpu_stats.system_cpu_usage.unwrap_or(0) as i64;
    let online = cpu_stats.online_cpus.unwrap_or(1) as f64;
    let cpu_usage_pct = if system_delta > 0 && online > 0.0 {
        (cpu_delta as f64 / system_delta as f64) * online * 100.0
    } else {
        0.0
    };

    let mem_usage = s.memory_stats.as_ref().and_then(|m| m.usage).unwrap_or(0);
    let mem_limit = s.memory_stats.as_ref().and_then(|m| m.limit).unwrap_or(0);
    let mem_pct = if mem_limit > 0 {
        mem_usage as f64 / mem_limit as f64 * 100.0
    } else {
        0.0
    };

    Some(ContainerStat {
        id: id.to_string(),
        name: name.to_string(),
        image: String::new(),
        status: String::new(),
        running: true,
        cpu_usage_pct,
        mem_usage_bytes: mem_usage,
        mem_limit_bytes: mem_limit,
        mem_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::secret::{ContainerCpuStats, ContainerCpuUsage, ContainerMemoryStats};

    fn cpu_stats(total_usage: u64, system_cpu_usage: u64) -> ContainerCpuStats {
        ContainerCpuStats {
            cpu_usage: Some(ContainerCpuUsage {
                total_usage: Some(total_usage),
                ..Default::default()
            }),
            system_cpu_usage: Some(system_cpu_usage),
            online_cpus: Some(2),
            throttling_data: None,
        }
    }

    #[test]
    fn returns_none_without_cpu_samples() {
        let s = ContainerStatsResponse {
            cpu_stats: None,
            precpu_stats: Some(cpu_stats(0, 0)),
            ..Default::default()
        };
        assert!(process_statistics(&s, "id", "name").is_none());
    }

    #[test]
    fn computes_cpu_and_memory_percent() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_stats(100_000_000, 1_000_000_000)),
            precpu_stats: Some(cpu_stats(50_000_000, 500_000_000)),
            memory_stats: Some(ContainerMemoryStats {
                usage: Some(256 * 1024 * 1024),
                limit: Some(512 * 1024 * 1024),
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = process_statistics(&s, "abc123", "db").unwrap();
        assert_eq!(out.id, "abc123");
        assert!((out.cpu_usage_pct - 20.0).abs() < 0.01);
        assert_eq!(out.mem_usage_bytes, 256 * 1024 * 1024);
        assert!((out.mem_pct - 50.0).abs() < 0.01);
        assert!(out.running);
    }

    #[test]
    fn zero_system_delta_yields_zero_cpu_percent() {
        let s = ContainerStatsResponse {
            cpu_stats: Some(cpu_stats(100, 500)),
            precpu_stats: Some(cpu_stats(50, 500)),
            ..Default::default()
        };
        let out = process_statistics(&s, "id", "n").unwrap();
        assert_eq!(out.cpu_usage_pct, 0.0);
    }
}
