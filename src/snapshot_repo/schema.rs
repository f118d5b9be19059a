// Star schema: hosts + dimensions, wide snapshot fact, child facts keyed by
// snapshot_id, and a one-row-per-host current_state projection. Timestamps
// are integers (ms for row bookkeeping, ns for collection instants) so
// ordering and uniqueness are exact.

pub(super) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS hosts (
        host_id     INTEGER PRIMARY KEY AUTOINCREMENT,
        agent_id    TEXT NOT NULL UNIQUE,
        machine_id  TEXT,
        boot_id     TEXT,
        hostname    TEXT,
        created_at_ms INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS disk_devices (
        disk_device_id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id        INTEGER NOT NULL REFERENCES hosts(host_id),
        device         TEXT NOT NULL,
        UNIQUE(host_id, device)
    )",
    "CREATE TABLE IF NOT EXISTS mountpoints (
        mountpoint_id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id       INTEGER NOT NULL REFERENCES hosts(host_id),
        mountpoint    TEXT NOT NULL,
        device        TEXT,
        fstype        TEXT,
        UNIQUE(host_id, mountpoint)
    )",
    "CREATE TABLE IF NOT EXISTS net_interfaces (
        net_interface_id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id          INTEGER NOT NULL REFERENCES hosts(host_id),
        name             TEXT NOT NULL,
        UNIQUE(host_id, name)
    )",
    "CREATE TABLE IF NOT EXISTS temp_sensors (
        temp_sensor_id INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id        INTEGER NOT NULL REFERENCES hosts(host_id),
        sensor_key     TEXT NOT NULL,
        UNIQUE(host_id, sensor_key)
    )",
    "CREATE TABLE IF NOT EXISTS docker_containers (
        docker_container_key INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id              INTEGER NOT NULL REFERENCES hosts(host_id),
        container_id         TEXT NOT NULL,
        UNIQUE(host_id, container_id)
    )",
    "CREATE TABLE IF NOT EXISTS process_names (
        process_name_id INTEGER PRIMARY KEY AUTOINCREMENT,
        name            TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS snapshots (
        snapshot_id        INTEGER PRIMARY KEY AUTOINCREMENT,
        host_id            INTEGER NOT NULL REFERENCES hosts(host_id),
        kind               TEXT NOT NULL,
        collected_at_ns    INTEGER NOT NULL,

        cpu_usage_pct      REAL,
        load_avg_1         REAL,
        load_avg_5         REAL,
        load_avg_15        REAL,
        cpu_model          TEXT,
        cpu_cores_logical  INTEGER,

        ram_usage_pct       REAL,
        ram_total_bytes     INTEGER,
        ram_available_bytes INTEGER,
        ram_used_bytes      INTEGER,
        ram_free_bytes      INTEGER,
        ram_cached_bytes    INTEGER,
        ram_buffered_bytes  INTEGER,

        swap_usage_pct     REAL,
        swap_total_bytes   INTEGER,
        swap_used_bytes    INTEGER,

        disk_usage_pct     REAL,
        disk_total_bytes   INTEGER,
        inode_usage_pct    REAL,
        inode_total        INTEGER,

        net_latency_ms     REAL,
        is_connected       INTEGER,
        active_tcp         INTEGER,

        docker_available   INTEGER,

        os                 TEXT,
        platform           TEXT,
        kernel_version     TEXT,
        uptime_seconds     INTEGER,
        procs              INTEGER,

        disk_read_bps         REAL,
        disk_write_bps        REAL,
        disk_read_iops        REAL,
        disk_write_iops       REAL,
        disk_avg_read_lat_ms  REAL,
        disk_avg_write_lat_ms REAL,

        net_tx_bps         REAL,
        net_rx_bps         REAL,
        net_err_per_s      REAL,
        net_drop_per_s     REAL,

        severity_level     INTEGER,
        risk_score         INTEGER,
        flags_bitmask      INTEGER,

        primary_cause      TEXT,
        cause_entity_type  TEXT,
        cause_entity_key   TEXT,
        explanation        TEXT,

        flag_host_offline              INTEGER,
        flag_cpu_overloaded            INTEGER,
        flag_memory_pressure           INTEGER,
        flag_memory_starvation         INTEGER,
        flag_swap_thrashing            INTEGER,
        flag_disk_space_critical       INTEGER,
        flag_inode_exhaustion          INTEGER,
        flag_disk_io_saturation        INTEGER,
        flag_disk_health_failed        INTEGER,
        flag_network_latency_degraded  INTEGER,
        flag_network_packet_loss       INTEGER,
        flag_network_interface_errors  INTEGER,
        flag_docker_unavailable        INTEGER,
        flag_container_cpu_hog         INTEGER,
        flag_container_memory_pressure INTEGER,
        flag_container_oom_risk        INTEGER,
        flag_runaway_process_cpu       INTEGER,
        flag_runaway_process_memory    INTEGER,
        flag_thermal_pressure          INTEGER,
        flag_system_at_risk            INTEGER,

        created_at_ms      INTEGER NOT NULL,
        UNIQUE(host_id, collected_at_ns)
    )",
    "CREATE INDEX IF NOT EXISTS idx_snapshots_host_time
        ON snapshots(host_id, collected_at_ns DESC)",
    "CREATE TABLE IF NOT EXISTS snapshot_cpu_cores (
        snapshot_id INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        core_index  INTEGER NOT NULL,
        usage_pct   REAL NOT NULL,
        PRIMARY KEY(snapshot_id, core_index)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_partition_usage (
        snapshot_id     INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        mountpoint_id   INTEGER NOT NULL REFERENCES mountpoints(mountpoint_id),
        used_percent    REAL,
        total_bytes     INTEGER,
        available_bytes INTEGER,
        inode_usage_pct REAL,
        inode_total     INTEGER,
        PRIMARY KEY(snapshot_id, mountpoint_id)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_disk_io (
        snapshot_id    INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        disk_device_id INTEGER NOT NULL REFERENCES disk_devices(disk_device_id),
        read_bytes     INTEGER,
        write_bytes    INTEGER,
        read_count     INTEGER,
        write_count    INTEGER,
        read_time_ms   INTEGER,
        write_time_ms  INTEGER,
        PRIMARY KEY(snapshot_id, disk_device_id)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_disk_health (
        snapshot_id    INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        disk_device_id INTEGER NOT NULL REFERENCES disk_devices(disk_device_id),
        status         TEXT,
        message        TEXT,
        PRIMARY KEY(snapshot_id, disk_device_id)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_net_interface_stats (
        snapshot_id      INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        net_interface_id INTEGER NOT NULL REFERENCES net_interfaces(net_interface_id),
        bytes_sent       INTEGER,
        bytes_recv       INTEGER,
        packets_sent     INTEGER,
        packets_recv     INTEGER,
        err_in           INTEGER,
        err_out          INTEGER,
        drop_in          INTEGER,
        drop_out         INTEGER,
        PRIMARY KEY(snapshot_id, net_interface_id)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_temperatures (
        snapshot_id    INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        temp_sensor_id INTEGER NOT NULL REFERENCES temp_sensors(temp_sensor_id),
        temperature_c  REAL NOT NULL,
        PRIMARY KEY(snapshot_id, temp_sensor_id)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_docker_container_stats (
        snapshot_id          INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        docker_container_key INTEGER NOT NULL REFERENCES docker_containers(docker_container_key),
        name            TEXT,
        image           TEXT,
        status          TEXT,
        running         INTEGER,
        cpu_usage_pct   REAL,
        mem_usage_bytes INTEGER,
        mem_limit_bytes INTEGER,
        mem_percent     REAL,
        PRIMARY KEY(snapshot_id, docker_container_key)
    )",
    "CREATE TABLE IF NOT EXISTS snapshot_top_processes (
        snapshot_id     INTEGER NOT NULL REFERENCES snapshots(snapshot_id),
        rank            INTEGER NOT NULL,
        pid             INTEGER NOT NULL,
        process_name_id INTEGER NOT NULL REFERENCES process_names(process_name_id),
        cpu_pct         REAL,
        mem_pct         REAL,
        PRIMARY KEY(snapshot_id, rank)
    )",
    "CREATE TABLE IF NOT EXISTS current_state (
        host_id          INTEGER PRIMARY KEY REFERENCES hosts(host_id),
        last_snapshot_id INTEGER,
        collected_at_ns  INTEGER,

        cpu_usage_pct       REAL,
        load_avg_1          REAL,
        ram_usage_pct       REAL,
        ram_available_bytes INTEGER,
        swap_usage_pct      REAL,
        disk_usage_pct      REAL,
        inode_usage_pct     REAL,
        net_latency_ms      REAL,
        is_connected        INTEGER,
        docker_available    INTEGER,

        disk_read_bps  REAL,
        disk_write_bps REAL,
        net_tx_bps     REAL,
        net_rx_bps     REAL,

        severity_level INTEGER,
        risk_score     INTEGER,
        flags_bitmask  INTEGER,
        explanation    TEXT,

        updated_at_ms  INTEGER NOT NULL
    )",
];
