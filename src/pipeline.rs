// Pipeline driver: periodic ticks through collect -> merge -> rates -> flag
// -> persist, with a fire-and-forget graph projection per tick.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::oneshot;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};

use crate::adapter;
use crate::flagger::{self, FlagPolicy};
use crate::graph_repo::GraphRepo;
use crate::models::{HostIdentity, RawSnapshot, SnapshotKind};
use crate::orchestrator::{MetricSource, SensorOrchestrator};
use crate::rates;
use crate::snapshot_repo::SnapshotRepo;

/// How often the loop reports its tick counters.
const STATS_LOG_INTERVAL_TICKS: u64 = 300;

/// Everything the driver needs, handed over at spawn.
pub struct PipelineDeps<M: MetricSource> {
    pub source: Arc<M>,
    pub repo: Arc<SnapshotRepo>,
    pub graph: Option<Arc<GraphRepo>>,
    pub policy: FlagPolicy,
    pub identity: HostIdentity,
    pub shutdown_rx: oneshot::Receiver<()>,
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub fast_poll_interval: Duration,
    pub slow_poll_interval: Duration,
    pub graph_deadline: Duration,
}

/// Result of one completed tick.
#[derive(Debug, Clone, Copy)]
pub struct TickOutcome {
    pub snapshot_id: i64,
    pub host_id: i64,
    pub severity_level: u8,
}

/// Cross-tick loop state: the carried-forward slow tier and the docker
/// availability of the previous tick (for the transition-sensitive flag).
#[derive(Default)]
struct TickState {
    last_slow: Option<RawSnapshot>,
    last_slow_at: Option<Instant>,
    prev_docker_available: Option<bool>,
}

/// Launch the background loop. Ticks fire at the fast-poll cadence; a tick
/// that overruns its interval causes the next one to be skipped rather than
/// queued. Shutdown stops new ticks; in-flight graph projections keep their
/// own deadline.
pub fn spawn<M: MetricSource + 'static>(
    deps: PipelineDeps<M>,
    config: PipelineConfig,
) -> tokio::task::JoinHandle<()> {
    let PipelineDeps {
        source,
        repo,
        graph,
        policy,
        identity,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut tick = interval(config.fast_poll_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut state = TickState::default();
        let mut ticks_ok: u64 = 0;
        let mut ticks_failed: u64 = 0;
        let mut ticks_since_log: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = &mut shutdown_rx => {
                    info!("pipeline shutting down");
                    break;
                }
            }

            match execute_tick(
                source.as_ref(),
                &repo,
                graph.clone(),
                &policy,
                &identity,
                &mut state,
                config.slow_poll_interval,
                config.graph_deadline,
            )
            .await
            {
                Ok(outcome) => {
                    ticks_ok += 1;
                    debug!(
                        snapshot_id = outcome.snapshot_id,
                        severity = outcome.severity_level,
                        "tick persisted"
                    );
                }
                Err(e) => {
                    ticks_failed += 1;
                    warn!("tick failed: {:#}", e);
                }
            }

            ticks_since_log += 1;
            if ticks_since_log >= STATS_LOG_INTERVAL_TICKS {
                info!(ticks_ok, ticks_failed, "pipeline stats");
                ticks_since_log = 0;
            }
        }
    })
}

/// Perform a single tick synchronously (both tiers run). The graph projection
/// is still spawned fire-and-forget with its own deadline.
pub async fn run_once<M: MetricSource>(
    source: &M,
    repo: &Arc<SnapshotRepo>,
    graph: Option<&Arc<GraphRepo>>,
    policy: &FlagPolicy,
    identity: &HostIdentity,
    graph_deadline: Duration,
) -> Result<TickOutcome> {
    let mut state = TickState::default();
    execute_tick(
        source,
        repo,
        graph.cloned(),
        policy,
        identity,
        &mut state,
        Duration::ZERO,
        graph_deadline,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn execute_tick<M: MetricSource>(
    source: &M,
    repo: &Arc<SnapshotRepo>,
    graph: Option<Arc<GraphRepo>>,
    policy: &FlagPolicy,
    identity: &HostIdentity,
    state: &mut TickState,
    slow_poll_interval: Duration,
    graph_deadline: Duration,
) -> Result<TickOutcome> {
    // 1. Fast tier; a failure here is fatal to the tick.
    let fast = source.collect_fast().await.context("collect fast")?;

    // 2. Slow tier only when its cadence window has elapsed; otherwise the
    //    previous slow values are carried forward.
    let slow_due = state
        .last_slow_at
        .is_none_or(|at| at.elapsed() >= slow_poll_interval);
    if slow_due {
        match source.collect_slow().await {
            Ok(slow) => {
                state.last_slow = Some(slow);
                state.last_slow_at = Some(Instant::now());
            }
            Err(e) => warn!("slow tier collection failed, carrying forward: {:#}", e),
        }
    }

    // 3-5. Merge, stamp, rates, flags. `collected_at` is stamped before the
    // transaction so commit order and timestamp order agree.
    let merged = SensorOrchestrator::merge(&fast, state.last_slow.as_ref());
    let snapshot = adapter::normalize(&merged, SnapshotKind::Merged, identity);

    let host_id = repo
        .upsert_host(
            &snapshot.agent_id,
            &snapshot.machine_id,
            &snapshot.boot_id,
            &snapshot.hostname,
        )
        .await?;
    let prev = repo.get_prev_counters(host_id).await?;
    let derived = rates::compute_rates(&snapshot, &prev);
    let flags = flagger::flag(&snapshot, &derived, policy, state.prev_docker_available);

    // 6. Blocking transactional insert.
    let outcome = repo
        .insert_snapshot(&snapshot, &derived, &flags)
        .await
        .context("persist snapshot")?;
    state.prev_docker_available = Some(snapshot.docker_available);

    // 7. Fire-and-forget graph projection on a detached deadline; the next
    //    tick does not await it and shutdown does not cancel it.
    let severity_level = flags.severity_level;
    if let Some(graph) = graph {
        let snapshot = snapshot.clone();
        let flags = flags.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(graph_deadline, graph.ingest_snapshot(&snapshot, &flags))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!("graph ingest failed: {:#}", e),
                Err(_) => warn!("graph ingest exceeded its deadline"),
            }
        });
    }

    Ok(TickOutcome {
        snapshot_id: outcome.snapshot_id,
        host_id,
        severity_level,
    })
}
