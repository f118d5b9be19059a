// Linux-specific helpers: /proc, /sys, /etc identity files, statvfs.

use crate::models::DiskIoCounters;

/// Read first "model name" from /proc/cpuinfo. Prefer over sysinfo when it returns "cpu0" etc.
pub(super) fn read_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        for line in content.lines() {
            if line.starts_with("model name") {
                let name = line
                    .find(": ")
                    .map(|i| line[i + 2..].trim())
                    .filter(|s| !s.is_empty() && *s != "cpu0")?;
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Read OS/distro pretty name from /etc/os-release.
pub(super) fn read_platform() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/etc/os-release").ok()?;
        for key in ["PRETTY_NAME=", "NAME="] {
            for line in content.lines() {
                if let Some(v) = line.strip_prefix(key) {
                    let v = v.trim_matches('"');
                    if !v.is_empty() {
                        return Some(v.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Cached and buffered memory in bytes from /proc/meminfo (values are in kB).
pub(super) fn read_cached_buffers() -> (u64, u64) {
    #[cfg(target_os = "linux")]
    {
        fn kb(line: &str) -> Option<u64> {
            line.split_whitespace().nth(1)?.parse::<u64>().ok()
        }
        if let Ok(content) = std::fs::read_to_string("/proc/meminfo") {
            let mut cached = 0u64;
            let mut buffers = 0u64;
            for line in content.lines() {
                if line.starts_with("Cached:") {
                    cached = kb(line).unwrap_or(0) * 1024;
                } else if line.starts_with("Buffers:") {
                    buffers = kb(line).unwrap_or(0) * 1024;
                }
            }
            return (cached, buffers);
        }
    }
    (0, 0)
}

/// Cumulative per-device IO counters from /proc/diskstats.
/// Sector counts are in 512-byte units regardless of the device sector size.
pub(super) fn read_diskstats() -> Vec<DiskIoCounters> {
    let mut out = Vec::new();
    #[cfg(target_os = "linux")]
    {
        let Ok(content) = std::fs::read_to_string("/proc/diskstats") else {
            return out;
        };
        for line in content.lines() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 14 {
                continue;
            }
            let name = fields[2];
            if name.starts_with("loop") || name.starts_with("ram") {
                continue;
            }
            let num = |i: usize| fields.get(i).and_then(|f| f.parse::<u64>().ok()).unwrap_or(0);
            out.push(DiskIoCounters {
                device: name.to_string(),
                read_count: num(3),
                read_bytes: num(5) * 512,
                read_time_ms: num(6),
                write_count: num(7),
                write_bytes: num(9) * 512,
                write_time_ms: num(10),
            });
        }
    }
    out
}

/// Dropped-packet counters (rx, tx) from /sys/class/net/<interface>/statistics.
pub(super) fn read_dropped(interface_name: &str) -> (u64, u64) {
    #[cfg(target_os = "linux")]
    {
        let stat = |file: &str| {
            std::fs::read_to_string(format!(
                "/sys/class/net/{}/statistics/{}",
                interface_name, file
            ))
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0)
        };
        return (stat("rx_dropped"), stat("tx_dropped"));
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = interface_name;
        (0, 0)
    }
}

/// Stable machine id from /etc/machine-id.
pub(super) fn read_machine_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let v = std::fs::read_to_string("/etc/machine-id").ok()?;
        let v = v.trim();
        if v.is_empty() {
            return None;
        }
        return Some(v.to_string());
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Per-boot id from /proc/sys/kernel/random/boot_id.
pub(super) fn read_boot_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let v = std::fs::read_to_string("/proc/sys/kernel/random/boot_id").ok()?;
        let v = v.trim();
        if v.is_empty() {
            return None;
        }
        return Some(v.to_string());
    }
    #[cfg(not(target_os = "linux"))]
    None
}

/// Count of TCP connections from /proc/net/tcp and /proc/net/tcp6.
pub(super) fn count_tcp_connections() -> u32 {
    let mut total = 0u32;
    #[cfg(target_os = "linux")]
    for path in ["/proc/net/tcp", "/proc/net/tcp6"] {
        if let Ok(content) = std::fs::read_to_string(path) {
            // First line is the column header.
            total += content.lines().skip(1).count() as u32;
        }
    }
    total
}

/// Inode usage for a mountpoint via statvfs: (used percent, total inodes).
pub(super) fn inode_usage(mountpoint: &str) -> Option<(f64, u64)> {
    #[cfg(target_os = "linux")]
    {
        let c_path = std::ffi::CString::new(mountpoint).ok()?;
        let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut vfs) };
        if rc != 0 {
            return None;
        }
        let total = vfs.f_files as u64;
        if total == 0 {
            return None;
        }
        let free = vfs.f_ffree as u64;
        let used = total.saturating_sub(free);
        return Some((used as f64 / total as f64 * 100.0, total));
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = mountpoint;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diskstats_counters_are_consistent() {
        for io in read_diskstats() {
            assert!(!io.device.is_empty());
            assert!(!io.device.starts_with("loop"));
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn root_inode_usage_is_a_percentage() {
        if let Some((pct, total)) = inode_usage("/") {
            assert!((0.0..=100.0).contains(&pct));
            assert!(total > 0);
        }
    }
}
