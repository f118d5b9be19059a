// Pipeline driver tests with a stub metric source: single ticks, rate
// progression, fatal-trio failures, docker degradation, spawn/shutdown.

mod common;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use common::{healthy_raw, identity, temp_repo};
use hostwatch::flagger::FlagPolicy;
use hostwatch::models::RawSnapshot;
use hostwatch::orchestrator::MetricSource;
use hostwatch::pipeline::{self, PipelineConfig, PipelineDeps};

struct StubSource {
    fast: RawSnapshot,
    slow: RawSnapshot,
    fail_fast: bool,
}

impl StubSource {
    fn healthy() -> Self {
        let raw = healthy_raw();
        Self {
            slow: raw.clone(),
            fast: raw,
            fail_fast: false,
        }
    }
}

impl MetricSource for StubSource {
    fn collect_fast(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        let result = if self.fail_fast {
            Err(anyhow!("sensor cpu: deadline exceeded"))
        } else {
            Ok(self.fast.clone())
        };
        async move { result }
    }

    fn collect_slow(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        let result = Ok(self.slow.clone());
        async move { result }
    }
}

#[tokio::test]
async fn run_once_persists_a_healthy_tick() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let source = StubSource::healthy();

    let outcome = pipeline::run_once(
        &source,
        &repo,
        None,
        &FlagPolicy::default(),
        &identity("agent-1"),
        Duration::from_secs(30),
    )
    .await
    .unwrap();
    assert_eq!(outcome.severity_level, 0);

    let rows = repo.query_snapshots(None, 10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].hostname, "testhost");
    assert_eq!(rows[0].risk_score, 0);
}

#[tokio::test]
async fn consecutive_ticks_accumulate_snapshots() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let source = StubSource::healthy();
    let policy = FlagPolicy::default();
    let id = identity("agent-1");

    pipeline::run_once(&source, &repo, None, &policy, &id, Duration::from_secs(30))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = pipeline::run_once(&source, &repo, None, &policy, &id, Duration::from_secs(30))
        .await
        .unwrap();

    let rows = repo.query_snapshots(None, 10).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].collected_at > rows[1].collected_at);

    let state = repo
        .get_current_state(second.host_id)
        .await
        .unwrap()
        .expect("current state");
    assert_eq!(state.last_snapshot_id, second.snapshot_id);
}

#[tokio::test]
async fn fast_tier_failure_fails_the_tick() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let source = StubSource {
        fail_fast: true,
        ..StubSource::healthy()
    };

    let result = pipeline::run_once(
        &source,
        &repo,
        None,
        &FlagPolicy::default(),
        &identity("agent-1"),
        Duration::from_secs(30),
    )
    .await;
    assert!(result.is_err());
    assert!(repo.query_snapshots(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn docker_outage_degrades_but_the_tick_succeeds() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let mut source = StubSource::healthy();
    source.fast.docker_available = false;
    source.fast.containers.clear();

    let outcome = pipeline::run_once(
        &source,
        &repo,
        None,
        &FlagPolicy::default(),
        &identity("agent-1"),
        Duration::from_secs(30),
    )
    .await
    .unwrap();

    let rows = repo.query_snapshots(None, 1).await.unwrap();
    assert_eq!(rows.len(), 1);
    // Docker was expected by default policy, so the tick flags it.
    assert_eq!(outcome.severity_level, 3);
}

#[tokio::test]
async fn spawned_loop_ticks_and_drains_on_shutdown() {
    let (_dir, repo) = temp_repo().await;
    let repo = Arc::new(repo);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let handle = pipeline::spawn(
        PipelineDeps {
            source: Arc::new(StubSource::healthy()),
            repo: repo.clone(),
            graph: None,
            policy: FlagPolicy::default(),
            identity: identity("agent-1"),
            shutdown_rx,
        },
        PipelineConfig {
            fast_poll_interval: Duration::from_millis(25),
            slow_poll_interval: Duration::from_secs(30),
            graph_deadline: Duration::from_secs(5),
        },
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    shutdown_tx.send(()).unwrap();
    handle.await.unwrap();

    let rows = repo.query_snapshots(None, 100).await.unwrap();
    assert!(
        !rows.is_empty(),
        "loop should have persisted at least one snapshot before shutdown"
    );
}
