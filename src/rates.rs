// Rate engine: per-second deltas between the current snapshot's cumulative
// counters and the previous snapshot's persisted sums.

use crate::models::{DerivedRates, NormalizedSnapshot, PrevCounters};

/// Elapsed intervals at or under this yield zero rates.
const MIN_INTERVAL_SECS: f64 = 0.1;

/// Compute derived rates. Returns all-zero rates when no baseline exists or
/// the elapsed interval is too short. Counter regressions (reboot, wraparound,
/// device replacement) clamp the delta to zero rather than going negative.
pub fn compute_rates(now: &NormalizedSnapshot, prev: &PrevCounters) -> DerivedRates {
    let Some(prev_at) = prev.collected_at else {
        return DerivedRates::default();
    };
    let dt = (now.collected_at - prev_at).num_nanoseconds().unwrap_or(0) as f64 / 1e9;
    if dt <= MIN_INTERVAL_SECS {
        return DerivedRates::default();
    }

    let mut cur = PrevCounters::default();
    for io in &now.io_counters {
        cur.disk_read_bytes += io.read_bytes;
        cur.disk_write_bytes += io.write_bytes;
        cur.disk_read_count += io.read_count;
        cur.disk_write_count += io.write_count;
        cur.disk_read_time_ms += io.read_time_ms;
        cur.disk_write_time_ms += io.write_time_ms;
    }
    for ni in &now.net_interfaces {
        cur.net_bytes_sent += ni.bytes_sent;
        cur.net_bytes_recv += ni.bytes_recv;
        cur.net_err_in += ni.err_in;
        cur.net_err_out += ni.err_out;
        cur.net_drop_in += ni.drop_in;
        cur.net_drop_out += ni.drop_out;
    }

    let mut rates = DerivedRates {
        disk_read_bps: rate(prev.disk_read_bytes, cur.disk_read_bytes, dt),
        disk_write_bps: rate(prev.disk_write_bytes, cur.disk_write_bytes, dt),
        disk_read_iops: rate(prev.disk_read_count, cur.disk_read_count, dt),
        disk_write_iops: rate(prev.disk_write_count, cur.disk_write_count, dt),
        net_tx_bps: rate(prev.net_bytes_sent, cur.net_bytes_sent, dt),
        net_rx_bps: rate(prev.net_bytes_recv, cur.net_bytes_recv, dt),
        net_err_per_s: rate(
            prev.net_err_in + prev.net_err_out,
            cur.net_err_in + cur.net_err_out,
            dt,
        ),
        net_drop_per_s: rate(
            prev.net_drop_in + prev.net_drop_out,
            cur.net_drop_in + cur.net_drop_out,
            dt,
        ),
        ..Default::default()
    };

    let read_ops = delta(prev.disk_read_count, cur.disk_read_count);
    if read_ops > 0 {
        rates.disk_avg_read_lat_ms =
            delta(prev.disk_read_time_ms, cur.disk_read_time_ms) as f64 / read_ops as f64;
    }
    let write_ops = delta(prev.disk_write_count, cur.disk_write_count);
    if write_ops > 0 {
        rates.disk_avg_write_lat_ms =
            delta(prev.disk_write_time_ms, cur.disk_write_time_ms) as f64 / write_ops as f64;
    }

    rates
}

fn rate(prev: u64, cur: u64, dt: f64) -> f64 {
    delta(prev, cur) as f64 / dt
}

fn delta(prev: u64, cur: u64) -> u64 {
    cur.saturating_sub(prev)
}
