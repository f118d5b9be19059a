// Rate engine tests: exact deltas, missing baselines, short intervals,
// counter regressions, latency division.

mod common;

use chrono::Duration;
use common::{healthy_snapshot, ts};
use hostwatch::models::PrevCounters;
use hostwatch::rates::compute_rates;

fn prev_matching_healthy(at_secs: i64) -> PrevCounters {
    // Sums matching the single io counter / interface in healthy_snapshot.
    PrevCounters {
        collected_at: Some(ts(at_secs)),
        disk_read_bytes: 1_000_000,
        disk_write_bytes: 2_000_000,
        disk_read_count: 100,
        disk_write_count: 200,
        disk_read_time_ms: 50,
        disk_write_time_ms: 80,
        net_bytes_sent: 10_000,
        net_bytes_recv: 20_000,
        net_err_in: 0,
        net_err_out: 0,
        net_drop_in: 0,
        net_drop_out: 0,
    }
}

#[test]
fn missing_baseline_yields_zero_rates() {
    let s = healthy_snapshot("agent-1", ts(1_700_000_001));
    let d = compute_rates(&s, &PrevCounters::default());
    assert_eq!(d, Default::default());
}

#[test]
fn ten_mebibytes_over_one_second_is_exact() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0 + 1));
    s.io_counters[0].read_bytes += 10_485_760;

    let d = compute_rates(&s, &prev_matching_healthy(t0));
    assert_eq!(d.disk_read_bps, 10_485_760.0);
    assert_eq!(d.disk_write_bps, 0.0);
    assert_eq!(d.net_tx_bps, 0.0);
}

#[test]
fn sub_hundred_millisecond_interval_yields_zero_rates() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0));
    s.collected_at = ts(t0) + Duration::milliseconds(50);
    s.io_counters[0].read_bytes += 10_485_760;

    let d = compute_rates(&s, &prev_matching_healthy(t0));
    assert_eq!(d, Default::default());
}

#[test]
fn counter_regression_clamps_to_zero() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0 + 10));
    // Counters went backwards: reboot or device replacement.
    s.io_counters[0].read_bytes = 10;
    s.net_interfaces[0].bytes_sent = 1;

    let d = compute_rates(&s, &prev_matching_healthy(t0));
    assert_eq!(d.disk_read_bps, 0.0);
    assert_eq!(d.net_tx_bps, 0.0);
    assert!(d.disk_write_bps >= 0.0);
}

#[test]
fn average_latency_divides_time_by_operations() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0 + 2));
    s.io_counters[0].read_count += 100;
    s.io_counters[0].read_time_ms += 500;
    // No write operations in the window.
    let d = compute_rates(&s, &prev_matching_healthy(t0));
    assert_eq!(d.disk_avg_read_lat_ms, 5.0);
    assert_eq!(d.disk_avg_write_lat_ms, 0.0);
    assert_eq!(d.disk_read_iops, 50.0);
}

#[test]
fn network_error_and_drop_rates_sum_both_directions() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0 + 4));
    s.net_interfaces[0].err_in += 2;
    s.net_interfaces[0].err_out += 2;
    s.net_interfaces[0].drop_in += 8;

    let d = compute_rates(&s, &prev_matching_healthy(t0));
    assert_eq!(d.net_err_per_s, 1.0);
    assert_eq!(d.net_drop_per_s, 2.0);
}

#[test]
fn all_rates_are_non_negative_and_finite() {
    let t0 = 1_700_000_000;
    let mut s = healthy_snapshot("agent-1", ts(t0 + 3));
    s.io_counters[0].read_bytes = 0;
    s.io_counters[0].write_bytes = u64::MAX / 2;
    s.net_interfaces[0].bytes_recv += 7;

    let d = compute_rates(&s, &prev_matching_healthy(t0));
    for v in [
        d.disk_read_bps,
        d.disk_write_bps,
        d.disk_read_iops,
        d.disk_write_iops,
        d.disk_avg_read_lat_ms,
        d.disk_avg_write_lat_ms,
        d.net_tx_bps,
        d.net_rx_bps,
        d.net_err_per_s,
        d.net_drop_per_s,
    ] {
        assert!(v.is_finite());
        assert!(v >= 0.0);
    }
}
