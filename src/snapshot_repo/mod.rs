// SQLite persistence for snapshots: normalized star schema with dimension
// upsert, transactional inserts and a per-host current-state projection.
// WAL keeps readers unblocked; SQLite itself enforces the single writer.

mod queries;
mod schema;

pub use queries::{CurrentState, SnapshotSummary};

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::RwLock;

use anyhow::{Context, Result, anyhow, ensure};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, SqliteConnection};

use crate::models::{DerivedRates, NormalizedSnapshot, PrevCounters, SnapshotFlags};

/// IDs of the rows created by one snapshot insert.
#[derive(Debug, Clone, Copy)]
pub struct InsertOutcome {
    pub snapshot_id: i64,
    pub host_id: i64,
}

type DimKey = (i64, &'static str, String);

pub struct SnapshotRepo {
    pool: SqlitePool,
    // Process-local dimension-id cache; correctness comes from the
    // probe-insert-reprobe upsert, the cache only saves round trips.
    dim_cache: RwLock<HashMap<DimKey, i64>>,
}

impl SnapshotRepo {
    pub async fn connect(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new().connect_with(opts).await?;
        Ok(Self {
            pool,
            dim_cache: RwLock::new(HashMap::new()),
        })
    }

    /// Idempotent schema creation; safe on an existing database.
    pub async fn migrate(&self) -> Result<()> {
        for stmt in schema::SCHEMA {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Create the host on first sight; update only newly non-empty identity
    /// fields on subsequent calls.
    pub async fn upsert_host(
        &self,
        agent_id: &str,
        machine_id: &str,
        boot_id: &str,
        hostname: &str,
    ) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::upsert_host_on(&mut *conn, agent_id, machine_id, boot_id, hostname).await
    }

    async fn upsert_host_on(
        conn: &mut SqliteConnection,
        agent_id: &str,
        machine_id: &str,
        boot_id: &str,
        hostname: &str,
    ) -> Result<i64> {
        ensure!(!agent_id.is_empty(), "agent_id required");
        let row = sqlx::query(
            "INSERT INTO hosts(agent_id, machine_id, boot_id, hostname, created_at_ms)
             VALUES (?, NULLIF(?,''), NULLIF(?,''), NULLIF(?,''), ?)
             ON CONFLICT(agent_id) DO UPDATE SET
               machine_id = COALESCE(excluded.machine_id, machine_id),
               boot_id    = COALESCE(excluded.boot_id, boot_id),
               hostname   = COALESCE(excluded.hostname, hostname)
             RETURNING host_id",
        )
        .bind(agent_id)
        .bind(machine_id)
        .bind(boot_id)
        .bind(hostname)
        .bind(Utc::now().timestamp_millis())
        .fetch_one(&mut *conn)
        .await
        .context("upsert host")?;
        Ok(row.try_get(0)?)
    }

    /// Summed child-table counters and timestamp of the most recent snapshot
    /// for a host; a zero record when no prior exists. One round trip.
    pub async fn get_prev_counters(&self, host_id: i64) -> Result<PrevCounters> {
        let row = sqlx::query(
            "SELECT s.collected_at_ns,
               (SELECT COALESCE(SUM(read_bytes),0)    FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_read_bytes,
               (SELECT COALESCE(SUM(write_bytes),0)   FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_write_bytes,
               (SELECT COALESCE(SUM(read_count),0)    FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_read_count,
               (SELECT COALESCE(SUM(write_count),0)   FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_write_count,
               (SELECT COALESCE(SUM(read_time_ms),0)  FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_read_time_ms,
               (SELECT COALESCE(SUM(write_time_ms),0) FROM snapshot_disk_io WHERE snapshot_id = s.snapshot_id) AS disk_write_time_ms,
               (SELECT COALESCE(SUM(bytes_sent),0)    FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_bytes_sent,
               (SELECT COALESCE(SUM(bytes_recv),0)    FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_bytes_recv,
               (SELECT COALESCE(SUM(err_in),0)        FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_err_in,
               (SELECT COALESCE(SUM(err_out),0)       FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_err_out,
               (SELECT COALESCE(SUM(drop_in),0)       FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_drop_in,
               (SELECT COALESCE(SUM(drop_out),0)      FROM snapshot_net_interface_stats WHERE snapshot_id = s.snapshot_id) AS net_drop_out
             FROM snapshots s
             WHERE s.host_id = ?
             ORDER BY s.collected_at_ns DESC
             LIMIT 1",
        )
        .bind(host_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(PrevCounters::default());
        };

        let ns: i64 = row.try_get("collected_at_ns")?;
        let get = |name: &str| -> Result<u64> {
            let v: i64 = row.try_get(name)?;
            Ok(v.max(0) as u64)
        };
        Ok(PrevCounters {
            collected_at: Some(DateTime::from_timestamp_nanos(ns)),
            disk_read_bytes: get("disk_read_bytes")?,
            disk_write_bytes: get("disk_write_bytes")?,
            disk_read_count: get("disk_read_count")?,
            disk_write_count: get("disk_write_count")?,
            disk_read_time_ms: get("disk_read_time_ms")?,
            disk_write_time_ms: get("disk_write_time_ms")?,
            net_bytes_sent: get("net_bytes_sent")?,
            net_bytes_recv: get("net_bytes_recv")?,
            net_err_in: get("net_err_in")?,
            net_err_out: get("net_err_out")?,
            net_drop_in: get("net_drop_in")?,
            net_drop_out: get("net_drop_out")?,
        })
    }

    /// Persist one snapshot: host upsert, fact row, children with dimension
    /// upserts, current-state upsert. One transaction; any error rolls the
    /// whole tick back.
    pub async fn insert_snapshot(
        &self,
        s: &NormalizedSnapshot,
        d: &DerivedRates,
        f: &SnapshotFlags,
    ) -> Result<InsertOutcome> {
        let collected_at_ns = s
            .collected_at
            .timestamp_nanos_opt()
            .ok_or_else(|| anyhow!("collected_at out of range"))?;
        let now_ms = Utc::now().timestamp_millis();

        let mut tx = self.pool.begin().await?;
        let host_id =
            Self::upsert_host_on(&mut *tx, &s.agent_id, &s.machine_id, &s.boot_id, &s.hostname)
                .await?;

        let row = sqlx::query(
            "INSERT INTO snapshots(
               host_id, kind, collected_at_ns,
               cpu_usage_pct, load_avg_1, load_avg_5, load_avg_15, cpu_model, cpu_cores_logical,
               ram_usage_pct, ram_total_bytes, ram_available_bytes, ram_used_bytes, ram_free_bytes, ram_cached_bytes, ram_buffered_bytes,
               swap_usage_pct, swap_total_bytes, swap_used_bytes,
               disk_usage_pct, disk_total_bytes, inode_usage_pct, inode_total,
               net_latency_ms, is_connected, active_tcp,
               docker_available,
               os, platform, kernel_version, uptime_seconds, procs,
               disk_read_bps, disk_write_bps, disk_read_iops, disk_write_iops, disk_avg_read_lat_ms, disk_avg_write_lat_ms,
               net_tx_bps, net_rx_bps, net_err_per_s, net_drop_per_s,
               severity_level, risk_score, flags_bitmask,
               primary_cause, cause_entity_type, cause_entity_key, explanation,
               flag_host_offline, flag_cpu_overloaded, flag_memory_pressure, flag_memory_starvation, flag_swap_thrashing,
               flag_disk_space_critical, flag_inode_exhaustion, flag_disk_io_saturation, flag_disk_health_failed,
               flag_network_latency_degraded, flag_network_packet_loss, flag_network_interface_errors,
               flag_docker_unavailable, flag_container_cpu_hog, flag_container_memory_pressure, flag_container_oom_risk,
               flag_runaway_process_cpu, flag_runaway_process_memory, flag_thermal_pressure, flag_system_at_risk,
               created_at_ms
             ) VALUES (
               ?,?,?,
               ?,?,?,?,?,?,
               ?,?,?,?,?,?,?,
               ?,?,?,
               ?,?,?,?,
               ?,?,?,
               ?,
               ?,?,?,?,?,
               ?,?,?,?,?,?,
               ?,?,?,?,
               ?,?,?,
               ?,?,?,?,
               ?,?,?,?,?,
               ?,?,?,?,
               ?,?,?,
               ?,?,?,?,
               ?,?,?,?,
               ?
             ) RETURNING snapshot_id",
        )
        .bind(host_id)
        .bind(s.kind.as_str())
        .bind(collected_at_ns)
        .bind(s.cpu_usage_pct)
        .bind(s.load.one)
        .bind(s.load.five)
        .bind(s.load.fifteen)
        .bind(&s.cpu_model)
        .bind(s.cpu_cores_logical as i64)
        .bind(s.ram_usage_pct)
        .bind(s.ram_total_bytes as i64)
        .bind(s.ram_available_bytes as i64)
        .bind(s.ram_used_bytes as i64)
        .bind(s.ram_free_bytes as i64)
        .bind(s.ram_cached_bytes as i64)
        .bind(s.ram_buffered_bytes as i64)
        .bind(s.swap_usage_pct)
        .bind(s.swap_total_bytes as i64)
        .bind(s.swap_used_bytes as i64)
        .bind(s.disk_usage_pct)
        .bind(s.disk_total_bytes as i64)
        .bind(s.inode_usage_pct)
        .bind(s.inode_total as i64)
        .bind(s.net_latency_ms)
        .bind(s.is_connected)
        .bind(s.active_tcp as i64)
        .bind(s.docker_available)
        .bind(&s.os)
        .bind(&s.platform)
        .bind(&s.kernel_version)
        .bind(s.uptime_secs as i64)
        .bind(s.process_count as i64)
        .bind(d.disk_read_bps)
        .bind(d.disk_write_bps)
        .bind(d.disk_read_iops)
        .bind(d.disk_write_iops)
        .bind(d.disk_avg_read_lat_ms)
        .bind(d.disk_avg_write_lat_ms)
        .bind(d.net_tx_bps)
        .bind(d.net_rx_bps)
        .bind(d.net_err_per_s)
        .bind(d.net_drop_per_s)
        .bind(f.severity_level as i64)
        .bind(f.risk_score as i64)
        .bind(f.bitmask() as i64)
        .bind(f.primary_cause.as_str())
        .bind(f.cause_entity_type.as_str())
        .bind(&f.cause_entity_key)
        .bind(&f.explanation)
        .bind(f.host_offline)
        .bind(f.cpu_overloaded)
        .bind(f.memory_pressure)
        .bind(f.memory_starvation)
        .bind(f.swap_thrashing)
        .bind(f.disk_space_critical)
        .bind(f.inode_exhaustion)
        .bind(f.disk_io_saturation)
        .bind(f.disk_health_failed)
        .bind(f.network_latency_degraded)
        .bind(f.network_packet_loss)
        .bind(f.network_interface_errors)
        .bind(f.docker_unavailable)
        .bind(f.container_cpu_hog)
        .bind(f.container_memory_pressure)
        .bind(f.container_oom_risk)
        .bind(f.runaway_process_cpu)
        .bind(f.runaway_process_memory)
        .bind(f.thermal_pressure)
        .bind(f.system_at_risk)
        .bind(now_ms)
        .fetch_one(&mut *tx)
        .await
        .context("insert snapshot")?;
        let snapshot_id: i64 = row.try_get(0)?;

        self.insert_children(&mut tx, host_id, snapshot_id, s).await?;
        self.upsert_current_state(&mut tx, host_id, snapshot_id, collected_at_ns, s, d, f, now_ms)
            .await?;

        tx.commit().await?;
        Ok(InsertOutcome {
            snapshot_id,
            host_id,
        })
    }

    async fn insert_children(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        snapshot_id: i64,
        s: &NormalizedSnapshot,
    ) -> Result<()> {
        for (i, usage) in s.cpu_per_core_pct.iter().enumerate() {
            sqlx::query(
                "INSERT INTO snapshot_cpu_cores(snapshot_id, core_index, usage_pct) VALUES(?,?,?)",
            )
            .bind(snapshot_id)
            .bind(i as i64)
            .bind(usage)
            .execute(&mut **tx)
            .await?;
        }

        for p in &s.partitions {
            let mountpoint_id = self
                .upsert_mountpoint(tx, host_id, &p.mountpoint, &p.device, &p.fstype)
                .await?;
            sqlx::query(
                "INSERT INTO snapshot_partition_usage(
                   snapshot_id, mountpoint_id, used_percent, total_bytes, available_bytes,
                   inode_usage_pct, inode_total
                 ) VALUES(?,?,?,?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(mountpoint_id)
            .bind(p.used_pct)
            .bind(p.total_bytes as i64)
            .bind(p.available_bytes as i64)
            .bind(p.inode_usage_pct)
            .bind(p.inode_total as i64)
            .execute(&mut **tx)
            .await?;
        }

        for io in &s.io_counters {
            let disk_device_id = self.upsert_disk_device(tx, host_id, &io.device).await?;
            sqlx::query(
                "INSERT INTO snapshot_disk_io(
                   snapshot_id, disk_device_id, read_bytes, write_bytes,
                   read_count, write_count, read_time_ms, write_time_ms
                 ) VALUES(?,?,?,?,?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(disk_device_id)
            .bind(io.read_bytes as i64)
            .bind(io.write_bytes as i64)
            .bind(io.read_count as i64)
            .bind(io.write_count as i64)
            .bind(io.read_time_ms as i64)
            .bind(io.write_time_ms as i64)
            .execute(&mut **tx)
            .await?;
        }

        for h in &s.disk_health {
            let disk_device_id = self.upsert_disk_device(tx, host_id, &h.device).await?;
            sqlx::query(
                "INSERT INTO snapshot_disk_health(snapshot_id, disk_device_id, status, message)
                 VALUES(?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(disk_device_id)
            .bind(h.status.as_str())
            .bind(&h.message)
            .execute(&mut **tx)
            .await?;
        }

        for ni in &s.net_interfaces {
            let net_interface_id = self.upsert_net_interface(tx, host_id, &ni.name).await?;
            sqlx::query(
                "INSERT INTO snapshot_net_interface_stats(
                   snapshot_id, net_interface_id, bytes_sent, bytes_recv,
                   packets_sent, packets_recv, err_in, err_out, drop_in, drop_out
                 ) VALUES(?,?,?,?,?,?,?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(net_interface_id)
            .bind(ni.bytes_sent as i64)
            .bind(ni.bytes_recv as i64)
            .bind(ni.packets_sent as i64)
            .bind(ni.packets_recv as i64)
            .bind(ni.err_in as i64)
            .bind(ni.err_out as i64)
            .bind(ni.drop_in as i64)
            .bind(ni.drop_out as i64)
            .execute(&mut **tx)
            .await?;
        }

        for t in &s.temperatures {
            let temp_sensor_id = self.upsert_temp_sensor(tx, host_id, &t.sensor_key).await?;
            sqlx::query(
                "INSERT INTO snapshot_temperatures(snapshot_id, temp_sensor_id, temperature_c)
                 VALUES(?,?,?)",
            )
            .bind(snapshot_id)
            .bind(temp_sensor_id)
            .bind(t.temperature_c)
            .execute(&mut **tx)
            .await?;
        }

        for c in &s.containers {
            let container_key = self.upsert_container(tx, host_id, &c.id).await?;
            sqlx::query(
                "INSERT INTO snapshot_docker_container_stats(
                   snapshot_id, docker_container_key, name, image, status, running,
                   cpu_usage_pct, mem_usage_bytes, mem_limit_bytes, mem_percent
                 ) VALUES(?,?,?,?,?,?,?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(container_key)
            .bind(&c.name)
            .bind(&c.image)
            .bind(&c.status)
            .bind(c.running)
            .bind(c.cpu_usage_pct)
            .bind(c.mem_usage_bytes as i64)
            .bind(c.mem_limit_bytes as i64)
            .bind(c.mem_pct)
            .execute(&mut **tx)
            .await?;
        }

        for p in &s.top_processes {
            let process_name_id = self.upsert_process_name(tx, &p.name).await?;
            sqlx::query(
                "INSERT INTO snapshot_top_processes(
                   snapshot_id, rank, pid, process_name_id, cpu_pct, mem_pct
                 ) VALUES(?,?,?,?,?,?)",
            )
            .bind(snapshot_id)
            .bind(p.rank as i64)
            .bind(p.pid as i64)
            .bind(process_name_id)
            .bind(p.cpu_pct)
            .bind(p.mem_pct)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn upsert_current_state(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        snapshot_id: i64,
        collected_at_ns: i64,
        s: &NormalizedSnapshot,
        d: &DerivedRates,
        f: &SnapshotFlags,
        now_ms: i64,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO current_state(
               host_id, last_snapshot_id, collected_at_ns,
               cpu_usage_pct, load_avg_1, ram_usage_pct, ram_available_bytes, swap_usage_pct,
               disk_usage_pct, inode_usage_pct, net_latency_ms, is_connected, docker_available,
               disk_read_bps, disk_write_bps, net_tx_bps, net_rx_bps,
               severity_level, risk_score, flags_bitmask, explanation, updated_at_ms
             ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
             ON CONFLICT(host_id) DO UPDATE SET
               last_snapshot_id    = excluded.last_snapshot_id,
               collected_at_ns     = excluded.collected_at_ns,
               cpu_usage_pct       = excluded.cpu_usage_pct,
               load_avg_1          = excluded.load_avg_1,
               ram_usage_pct       = excluded.ram_usage_pct,
               ram_available_bytes = excluded.ram_available_bytes,
               swap_usage_pct      = excluded.swap_usage_pct,
               disk_usage_pct      = excluded.disk_usage_pct,
               inode_usage_pct     = excluded.inode_usage_pct,
               net_latency_ms      = excluded.net_latency_ms,
               is_connected        = excluded.is_connected,
               docker_available    = excluded.docker_available,
               disk_read_bps       = excluded.disk_read_bps,
               disk_write_bps      = excluded.disk_write_bps,
               net_tx_bps          = excluded.net_tx_bps,
               net_rx_bps          = excluded.net_rx_bps,
               severity_level      = excluded.severity_level,
               risk_score          = excluded.risk_score,
               flags_bitmask       = excluded.flags_bitmask,
               explanation         = excluded.explanation,
               updated_at_ms       = excluded.updated_at_ms",
        )
        .bind(host_id)
        .bind(snapshot_id)
        .bind(collected_at_ns)
        .bind(s.cpu_usage_pct)
        .bind(s.load.one)
        .bind(s.ram_usage_pct)
        .bind(s.ram_available_bytes as i64)
        .bind(s.swap_usage_pct)
        .bind(s.disk_usage_pct)
        .bind(s.inode_usage_pct)
        .bind(s.net_latency_ms)
        .bind(s.is_connected)
        .bind(s.docker_available)
        .bind(d.disk_read_bps)
        .bind(d.disk_write_bps)
        .bind(d.net_tx_bps)
        .bind(d.net_rx_bps)
        .bind(f.severity_level as i64)
        .bind(f.risk_score as i64)
        .bind(f.bitmask() as i64)
        .bind(&f.explanation)
        .bind(now_ms)
        .execute(&mut **tx)
        .await
        .context("upsert current_state")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dimension upserts: cache read, SELECT probe, INSERT OR IGNORE, then
    // re-probe. The re-probe also covers a concurrent insert of the same key.
    // ------------------------------------------------------------------

    fn cache_get(&self, host_id: i64, table: &'static str, key: &str) -> Option<i64> {
        let cache = self.dim_cache.read().ok()?;
        cache.get(&(host_id, table, key.to_string())).copied()
    }

    fn cache_put(&self, host_id: i64, table: &'static str, key: &str, id: i64) {
        if let Ok(mut cache) = self.dim_cache.write() {
            cache.insert((host_id, table, key.to_string()), id);
        }
    }

    async fn upsert_dim(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        table: &'static str,
        select_sql: &'static str,
        insert_sql: &'static str,
        host_id: i64,
        key: &str,
    ) -> Result<i64> {
        if let Some(id) = self.cache_get(host_id, table, key) {
            return Ok(id);
        }
        if let Some(row) = sqlx::query(select_sql)
            .bind(host_id)
            .bind(key)
            .fetch_optional(&mut **tx)
            .await?
        {
            let id: i64 = row.try_get(0)?;
            self.cache_put(host_id, table, key, id);
            return Ok(id);
        }
        sqlx::query(insert_sql)
            .bind(host_id)
            .bind(key)
            .execute(&mut **tx)
            .await?;
        let row = sqlx::query(select_sql)
            .bind(host_id)
            .bind(key)
            .fetch_one(&mut **tx)
            .await?;
        let id: i64 = row.try_get(0)?;
        self.cache_put(host_id, table, key, id);
        Ok(id)
    }

    async fn upsert_disk_device(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        device: &str,
    ) -> Result<i64> {
        self.upsert_dim(
            tx,
            "disk_devices",
            "SELECT disk_device_id FROM disk_devices WHERE host_id=? AND device=?",
            "INSERT OR IGNORE INTO disk_devices(host_id, device) VALUES(?,?)",
            host_id,
            device,
        )
        .await
    }

    async fn upsert_net_interface(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        name: &str,
    ) -> Result<i64> {
        self.upsert_dim(
            tx,
            "net_interfaces",
            "SELECT net_interface_id FROM net_interfaces WHERE host_id=? AND name=?",
            "INSERT OR IGNORE INTO net_interfaces(host_id, name) VALUES(?,?)",
            host_id,
            name,
        )
        .await
    }

    async fn upsert_temp_sensor(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        sensor_key: &str,
    ) -> Result<i64> {
        self.upsert_dim(
            tx,
            "temp_sensors",
            "SELECT temp_sensor_id FROM temp_sensors WHERE host_id=? AND sensor_key=?",
            "INSERT OR IGNORE INTO temp_sensors(host_id, sensor_key) VALUES(?,?)",
            host_id,
            sensor_key,
        )
        .await
    }

    async fn upsert_container(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        container_id: &str,
    ) -> Result<i64> {
        self.upsert_dim(
            tx,
            "docker_containers",
            "SELECT docker_container_key FROM docker_containers WHERE host_id=? AND container_id=?",
            "INSERT OR IGNORE INTO docker_containers(host_id, container_id) VALUES(?,?)",
            host_id,
            container_id,
        )
        .await
    }

    async fn upsert_mountpoint(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        host_id: i64,
        mountpoint: &str,
        device: &str,
        fstype: &str,
    ) -> Result<i64> {
        if let Some(id) = self.cache_get(host_id, "mountpoints", mountpoint) {
            return Ok(id);
        }
        let select = "SELECT mountpoint_id FROM mountpoints WHERE host_id=? AND mountpoint=?";
        if let Some(row) = sqlx::query(select)
            .bind(host_id)
            .bind(mountpoint)
            .fetch_optional(&mut **tx)
            .await?
        {
            let id: i64 = row.try_get(0)?;
            self.cache_put(host_id, "mountpoints", mountpoint, id);
            return Ok(id);
        }
        sqlx::query(
            "INSERT OR IGNORE INTO mountpoints(host_id, mountpoint, device, fstype)
             VALUES(?,?,NULLIF(?,''),NULLIF(?,''))",
        )
        .bind(host_id)
        .bind(mountpoint)
        .bind(device)
        .bind(fstype)
        .execute(&mut **tx)
        .await?;
        let row = sqlx::query(select)
            .bind(host_id)
            .bind(mountpoint)
            .fetch_one(&mut **tx)
            .await?;
        let id: i64 = row.try_get(0)?;
        self.cache_put(host_id, "mountpoints", mountpoint, id);
        Ok(id)
    }

    // Process names are a global dictionary, not host-scoped.
    async fn upsert_process_name(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        name: &str,
    ) -> Result<i64> {
        if let Some(id) = self.cache_get(0, "process_names", name) {
            return Ok(id);
        }
        let select = "SELECT process_name_id FROM process_names WHERE name=?";
        if let Some(row) = sqlx::query(select)
            .bind(name)
            .fetch_optional(&mut **tx)
            .await?
        {
            let id: i64 = row.try_get(0)?;
            self.cache_put(0, "process_names", name, id);
            return Ok(id);
        }
        sqlx::query("INSERT OR IGNORE INTO process_names(name) VALUES(?)")
            .bind(name)
            .execute(&mut **tx)
            .await?;
        let row = sqlx::query(select).bind(name).fetch_one(&mut **tx).await?;
        let id: i64 = row.try_get(0)?;
        self.cache_put(0, "process_names", name, id);
        Ok(id)
    }

    /// Underlying pool, for read-side extensions.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
