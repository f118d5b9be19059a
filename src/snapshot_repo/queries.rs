// Read-side queries: recent snapshot summaries and the current-state row.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SnapshotRepo;
use crate::models::PrimaryCause;

const DEFAULT_QUERY_LIMIT: u32 = 10;
const MAX_QUERY_LIMIT: u32 = 100;

/// Simplified snapshot row for query consumers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotSummary {
    pub snapshot_id: i64,
    pub host_id: i64,
    pub hostname: String,
    pub collected_at: DateTime<Utc>,
    pub kind: String,
    pub cpu_usage_pct: f64,
    pub ram_usage_pct: f64,
    pub disk_usage_pct: f64,
    pub severity_level: u8,
    pub risk_score: u8,
    pub primary_cause: PrimaryCause,
    pub explanation: String,
}

/// The one-row-per-host dashboard projection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    pub host_id: i64,
    pub last_snapshot_id: i64,
    pub collected_at: DateTime<Utc>,
    pub cpu_usage_pct: f64,
    pub load_avg_1: f64,
    pub ram_usage_pct: f64,
    pub ram_available_bytes: u64,
    pub swap_usage_pct: f64,
    pub disk_usage_pct: f64,
    pub inode_usage_pct: f64,
    pub net_latency_ms: f64,
    pub is_connected: bool,
    pub docker_available: bool,
    pub disk_read_bps: f64,
    pub disk_write_bps: f64,
    pub net_tx_bps: f64,
    pub net_rx_bps: f64,
    pub severity_level: u8,
    pub risk_score: u8,
    pub flags_bitmask: u64,
    pub explanation: String,
}

impl SnapshotRepo {
    /// Up to `limit` most recent snapshot summaries, newest first, optionally
    /// filtered by hostname. Limit is clamped to 1..=100; 0 means the default
    /// of 10. Always returns a (possibly empty) vector.
    pub async fn query_snapshots(
        &self,
        hostname: Option<&str>,
        limit: u32,
    ) -> Result<Vec<SnapshotSummary>> {
        let limit = if limit == 0 {
            DEFAULT_QUERY_LIMIT
        } else {
            limit.min(MAX_QUERY_LIMIT)
        };

        let base = "SELECT
               s.snapshot_id, s.host_id,
               COALESCE(h.hostname, 'unknown') AS hostname,
               s.collected_at_ns, s.kind,
               COALESCE(s.cpu_usage_pct, 0)  AS cpu_usage_pct,
               COALESCE(s.ram_usage_pct, 0)  AS ram_usage_pct,
               COALESCE(s.disk_usage_pct, 0) AS disk_usage_pct,
               COALESCE(s.severity_level, 0) AS severity_level,
               COALESCE(s.risk_score, 0)     AS risk_score,
               COALESCE(s.primary_cause, 'none') AS primary_cause,
               COALESCE(s.explanation, '')   AS explanation
             FROM snapshots s
             LEFT JOIN hosts h ON s.host_id = h.host_id";

        let rows = match hostname.filter(|h| !h.is_empty()) {
            Some(host) => {
                let sql = format!(
                    "{base} WHERE h.hostname = ? ORDER BY s.collected_at_ns DESC LIMIT ?"
                );
                sqlx::query(&sql)
                    .bind(host)
                    .bind(limit as i64)
                    .fetch_all(self.pool())
                    .await
            }
            None => {
                let sql = format!("{base} ORDER BY s.collected_at_ns DESC LIMIT ?");
                sqlx::query(&sql).bind(limit as i64).fetch_all(self.pool()).await
            }
        }
        .context("query snapshots")?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Most recent snapshot summary for a host, or None when nothing matches.
    pub async fn get_latest_snapshot(
        &self,
        hostname: Option<&str>,
    ) -> Result<Option<SnapshotSummary>> {
        Ok(self.query_snapshots(hostname, 1).await?.into_iter().next())
    }

    /// The current-state projection for a host, or None before its first tick.
    pub async fn get_current_state(&self, host_id: i64) -> Result<Option<CurrentState>> {
        let row = sqlx::query(
            "SELECT host_id, last_snapshot_id, collected_at_ns,
               cpu_usage_pct, load_avg_1, ram_usage_pct, ram_available_bytes, swap_usage_pct,
               disk_usage_pct, inode_usage_pct, net_latency_ms, is_connected, docker_available,
               disk_read_bps, disk_write_bps, net_tx_bps, net_rx_bps,
               severity_level, risk_score, flags_bitmask, explanation
             FROM current_state WHERE host_id = ?",
        )
        .bind(host_id)
        .fetch_optional(self.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let ns: i64 = row.try_get("collected_at_ns")?;
        Ok(Some(CurrentState {
            host_id: row.try_get("host_id")?,
            last_snapshot_id: row.try_get("last_snapshot_id")?,
            collected_at: DateTime::from_timestamp_nanos(ns),
            cpu_usage_pct: row.try_get("cpu_usage_pct")?,
            load_avg_1: row.try_get("load_avg_1")?,
            ram_usage_pct: row.try_get("ram_usage_pct")?,
            ram_available_bytes: row.try_get::<i64, _>("ram_available_bytes")?.max(0) as u64,
            swap_usage_pct: row.try_get("swap_usage_pct")?,
            disk_usage_pct: row.try_get("disk_usage_pct")?,
            inode_usage_pct: row.try_get("inode_usage_pct")?,
            net_latency_ms: row.try_get("net_latency_ms")?,
            is_connected: row.try_get("is_connected")?,
            docker_available: row.try_get("docker_available")?,
            disk_read_bps: row.try_get("disk_read_bps")?,
            disk_write_bps: row.try_get("disk_write_bps")?,
            net_tx_bps: row.try_get("net_tx_bps")?,
            net_rx_bps: row.try_get("net_rx_bps")?,
            severity_level: row.try_get::<i64, _>("severity_level")?.clamp(0, 4) as u8,
            risk_score: row.try_get::<i64, _>("risk_score")?.clamp(0, 100) as u8,
            flags_bitmask: row.try_get::<i64, _>("flags_bitmask")? as u64,
            explanation: row.try_get("explanation")?,
        }))
    }

    /// Look up a host id by agent id, if the host has been seen.
    pub async fn find_host(&self, agent_id: &str) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT host_id FROM hosts WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(match row {
            Some(row) => Some(row.try_get(0)?),
            None => None,
        })
    }
}

fn summary_from_row(row: &SqliteRow) -> Result<SnapshotSummary> {
    let ns: i64 = row.try_get("collected_at_ns")?;
    let cause: String = row.try_get("primary_cause")?;
    Ok(SnapshotSummary {
        snapshot_id: row.try_get("snapshot_id")?,
        host_id: row.try_get("host_id")?,
        hostname: row.try_get("hostname")?,
        collected_at: DateTime::from_timestamp_nanos(ns),
        kind: row.try_get("kind")?,
        cpu_usage_pct: row.try_get("cpu_usage_pct")?,
        ram_usage_pct: row.try_get("ram_usage_pct")?,
        disk_usage_pct: row.try_get("disk_usage_pct")?,
        severity_level: row.try_get::<i64, _>("severity_level")?.clamp(0, 4) as u8,
        risk_score: row.try_get::<i64, _>("risk_score")?.clamp(0, 100) as u8,
        primary_cause: PrimaryCause::parse(&cause),
        explanation: row.try_get("explanation")?,
    })
}
