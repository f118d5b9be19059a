// Property-graph projection of snapshots into Neo4j, plus the read-only
// query API used by retrieval layers. The relational write stays
// authoritative; everything here is a best-effort eventually-consistent view.

mod cypher;

use anyhow::{Context, Result};
use neo4rs::{ConfigBuilder, Graph, Query, query};
use serde_json::{Map, Value};

use crate::config::GraphSettings;
use crate::models::{CauseEntityType, NormalizedSnapshot, PrimaryCause, SnapshotFlags};

pub struct GraphRepo {
    graph: Graph,
}

impl GraphRepo {
    pub async fn connect(settings: &GraphSettings) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str())
            .db(settings.database.as_str())
            .build()
            .context("graph config")?;
        let graph = Graph::connect(config)
            .await
            .context("connect to graph store")?;
        Ok(Self { graph })
    }

    /// Project one snapshot into the graph. Host and dimension nodes merge on
    /// their natural keys so they accrete across ticks; Snapshot, Cause and
    /// relationship instances are append-only. One write transaction.
    pub async fn ingest_snapshot(&self, s: &NormalizedSnapshot, f: &SnapshotFlags) -> Result<()> {
        let nanos = s
            .collected_at
            .timestamp_nanos_opt()
            .context("collected_at out of range")?;
        let snapshot_key = format!("{}-{}", s.agent_id, nanos);

        let mut queries: Vec<Query> = Vec::new();

        queries.push(
            query(
                "MERGE (h:Host {agent_id: $agent_id})
                 SET h.machine_id = $machine_id,
                     h.boot_id = $boot_id,
                     h.hostname = $hostname,
                     h.os = $os,
                     h.platform = $platform,
                     h.kernel_version = $kernel_version",
            )
            .param("agent_id", s.agent_id.as_str())
            .param("machine_id", s.machine_id.as_str())
            .param("boot_id", s.boot_id.as_str())
            .param("hostname", s.hostname.as_str())
            .param("os", s.os.as_str())
            .param("platform", s.platform.as_str())
            .param("kernel_version", s.kernel_version.as_str()),
        );

        queries.push(
            query(
                "MATCH (h:Host {agent_id: $agent_id})
                 CREATE (sn:Snapshot {
                   snapshot_key: $key,
                   collected_at: $collected_at,
                   collected_at_ns: $collected_at_ns,
                   kind: $kind,
                   cpu_usage_pct: $cpu_usage_pct,
                   ram_usage_pct: $ram_usage_pct,
                   disk_usage_pct: $disk_usage_pct,
                   severity_level: $severity_level,
                   risk_score: $risk_score,
                   primary_cause: $primary_cause,
                   explanation: $explanation
                 })
                 CREATE (h)-[:HAS_SNAPSHOT]->(sn)",
            )
            .param("agent_id", s.agent_id.as_str())
            .param("key", snapshot_key.as_str())
            .param("collected_at", s.collected_at.to_rfc3339())
            .param("collected_at_ns", nanos)
            .param("kind", s.kind.as_str())
            .param("cpu_usage_pct", s.cpu_usage_pct)
            .param("ram_usage_pct", s.ram_usage_pct)
            .param("disk_usage_pct", s.disk_usage_pct)
            .param("severity_level", f.severity_level as i64)
            .param("risk_score", f.risk_score as i64)
            .param("primary_cause", f.primary_cause.as_str())
            .param("explanation", f.explanation.as_str()),
        );

        for name in f.triggered() {
            queries.push(
                query(
                    "MATCH (sn:Snapshot {snapshot_key: $key})
                     MERGE (fl:Flag {name: $name})
                     CREATE (sn)-[:TRIGGERED]->(fl)",
                )
                .param("key", snapshot_key.as_str())
                .param("name", name),
            );
        }

        if f.primary_cause != PrimaryCause::None {
            queries.push(
                query(
                    "MATCH (sn:Snapshot {snapshot_key: $key})
                     CREATE (c:Cause {
                       primary_cause: $primary_cause,
                       entity_type: $entity_type,
                       entity_key: $entity_key,
                       explanation: $explanation
                     })
                     CREATE (sn)-[:HAS_CAUSE]->(c)",
                )
                .param("key", snapshot_key.as_str())
                .param("primary_cause", f.primary_cause.as_str())
                .param("entity_type", f.cause_entity_type.as_str())
                .param("entity_key", f.cause_entity_key.as_str())
                .param("explanation", f.explanation.as_str()),
            );
            if let Some(q) = cause_entity_query(s, f, &snapshot_key) {
                queries.push(q);
            }
        }

        for io in &s.io_counters {
            queries.push(
                query(
                    "MATCH (sn:Snapshot {snapshot_key: $key})
                     MERGE (d:DiskDevice {agent_id: $agent_id, device: $device})
                     CREATE (sn)-[:OBSERVED_DISK_IO {
                       read_bytes: $read_bytes, write_bytes: $write_bytes,
                       read_count: $read_count, write_count: $write_count
                     }]->(d)",
                )
                .param("key", snapshot_key.as_str())
                .param("agent_id", s.agent_id.as_str())
                .param("device", io.device.as_str())
                .param("read_bytes", io.read_bytes as i64)
                .param("write_bytes", io.write_bytes as i64)
                .param("read_count", io.read_count as i64)
                .param("write_count", io.write_count as i64),
            );
        }

        for ni in &s.net_interfaces {
            queries.push(
                query(
                    "MATCH (sn:Snapshot {snapshot_key: $key})
                     MERGE (n:NetInterface {agent_id: $agent_id, name: $name})
                     CREATE (sn)-[:OBSERVED_INTERFACE {
                       bytes_sent: $bytes_sent, bytes_recv: $bytes_recv,
                       packets_sent: $packets_sent, packets_recv: $packets_recv,
                       err_in: $err_in, err_out: $err_out,
                       drop_in: $drop_in, drop_out: $drop_out
                     }]->(n)",
                )
                .param("key", snapshot_key.as_str())
                .param("agent_id", s.agent_id.as_str())
                .param("name", ni.name.as_str())
                .param("bytes_sent", ni.bytes_sent as i64)
                .param("bytes_recv", ni.bytes_recv as i64)
                .param("packets_sent", ni.packets_sent as i64)
                .param("packets_recv", ni.packets_recv as i64)
                .param("err_in", ni.err_in as i64)
                .param("err_out", ni.err_out as i64)
                .param("drop_in", ni.drop_in as i64)
                .param("drop_out", ni.drop_out as i64),
            );
        }

        for c in &s.containers {
            queries.push(
                query(
                    "MATCH (sn:Snapshot {snapshot_key: $key})
                     MERGE (cnt:Container {container_id: $container_id})
                     SET cnt.name = $name, cnt.image = $image, cnt.agent_id = $agent_id
                     CREATE (sn)-[:OBSERVED_CONTAINER {
                       cpu_usage_pct: $cpu_usage_pct,
                       mem_usage_bytes: $mem_usage_bytes,
                       status: $status
                     }]->(cnt)",
                )
                .param("key", snapshot_key.as_str())
                .param("container_id", c.id.as_str())
                .param("name", c.name.as_str())
                .param("image", c.image.as_str())
                .param("agent_id", s.agent_id.as_str())
                .param("cpu_usage_pct", c.cpu_usage_pct)
                .param("mem_usage_bytes", c.mem_usage_bytes as i64)
                .param("status", c.status.as_str()),
            );
        }

        let mut txn = self.graph.start_txn().await?;
        for q in queries {
            txn.run(q).await?;
        }
        txn.commit().await?;
        Ok(())
    }

    /// Execute a read-only Cypher query, returning rows as property maps.
    /// Write/delete clauses are rejected before submission.
    pub async fn execute_cypher(&self, q: &str) -> Result<Vec<Map<String, Value>>> {
        cypher::ensure_read_only(q)?;
        let mut stream = self
            .graph
            .execute(query(q))
            .await
            .context("cypher execution")?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.context("cypher stream")? {
            rows.push(cypher::convert_row(&row)?);
        }
        Ok(rows)
    }
}

fn cause_entity_query(
    s: &NormalizedSnapshot,
    f: &SnapshotFlags,
    snapshot_key: &str,
) -> Option<Query> {
    let text = match f.cause_entity_type {
        CauseEntityType::Container => {
            "MATCH (sn:Snapshot {snapshot_key: $key})-[:HAS_CAUSE]->(c:Cause)
             MERGE (t:Container {container_id: $entity_key})
             CREATE (c)-[:CAUSED_BY]->(t)"
        }
        CauseEntityType::Disk => {
            "MATCH (sn:Snapshot {snapshot_key: $key})-[:HAS_CAUSE]->(c:Cause)
             MERGE (t:DiskDevice {agent_id: $agent_id, device: $entity_key})
             CREATE (c)-[:CAUSED_BY]->(t)"
        }
        CauseEntityType::Netif => {
            "MATCH (sn:Snapshot {snapshot_key: $key})-[:HAS_CAUSE]->(c:Cause)
             MERGE (t:NetInterface {agent_id: $agent_id, name: $entity_key})
             CREATE (c)-[:CAUSED_BY]->(t)"
        }
        _ => return None,
    };
    Some(
        query(text)
            .param("key", snapshot_key)
            .param("agent_id", s.agent_id.as_str())
            .param("entity_key", f.cause_entity_key.as_str()),
    )
}
