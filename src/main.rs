use std::sync::Arc;

use anyhow::Result;
use hostwatch::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::from_env()?;
    tracing::info!(
        agent_id = %app_config.agent_id,
        "starting {} {}",
        version::NAME,
        version::VERSION
    );

    let repo = Arc::new(snapshot_repo::SnapshotRepo::connect(&app_config.database_path).await?);
    repo.migrate().await?;

    // Graph projection is best-effort: a store that is down at boot just
    // disables the projector for this run.
    let graph = match &app_config.graph {
        Some(settings) => match graph_repo::GraphRepo::connect(settings).await {
            Ok(g) => Some(Arc::new(g)),
            Err(e) => {
                tracing::warn!("graph store unavailable, projection disabled: {:#}", e);
                None
            }
        },
        None => None,
    };

    let source = Arc::new(orchestrator::SensorOrchestrator::new(&app_config.collector));
    let identity = app_config.identity();

    // First tick runs synchronously; a failure in the fast-tier critical trio
    // aborts startup.
    let first = pipeline::run_once(
        source.as_ref(),
        &repo,
        graph.as_ref(),
        &app_config.policy,
        &identity,
        app_config.collector.graph_deadline,
    )
    .await?;
    tracing::info!(
        snapshot_id = first.snapshot_id,
        severity = first.severity_level,
        "first tick persisted"
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let handle = pipeline::spawn(
        pipeline::PipelineDeps {
            source,
            repo,
            graph,
            policy: app_config.policy.clone(),
            identity,
            shutdown_rx,
        },
        pipeline::PipelineConfig {
            fast_poll_interval: app_config.collector.fast_poll_interval,
            slow_poll_interval: app_config.collector.slow_poll_interval,
            graph_deadline: app_config.collector.graph_deadline,
        },
    );

    wait_for_shutdown().await;
    tracing::info!("received shutdown signal");
    let _ = shutdown_tx.send(());
    let _ = handle.await;

    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
