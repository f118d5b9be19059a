// Docker container stats via bollard, with a CLI fallback for hosts where
// the unix socket is not reachable (Docker Desktop).

mod stats;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bollard::Docker;
use bollard::query_parameters::{ListContainersOptions, StatsOptions};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::warn;

use super::{Sensor, SensorPayload};
use crate::models::{ContainerStat, DockerReading};

const CLI_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CLI_LIST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct DockerSensor {
    docker: Option<Docker>,
    live_stats: Arc<RwLock<HashMap<String, ContainerStat>>>,
    active_streams: Arc<RwLock<HashMap<String, tokio::task::JoinHandle<()>>>>,
}

impl DockerSensor {
    pub(crate) fn new() -> Self {
        Self {
            docker: Docker::connect_with_unix_defaults().ok(),
            live_stats: Arc::new(RwLock::new(HashMap::new())),
            active_streams: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn collect_via_socket(&self, docker: &Docker) -> Result<DockerReading> {
        let mut filters = HashMap::new();
        filters.insert("status".to_string(), vec!["running".to_string()]);
        let filter = ListContainersOptions {
            all: false,
            filters: Some(filters),
            ..Default::default()
        };
        let containers = docker.list_containers(Some(filter)).await?;

        let mut running_ids = Vec::with_capacity(containers.len());
        let mut listed = HashMap::with_capacity(containers.len());
        for c in &containers {
            let id = c.id.as_ref().cloned().unwrap_or_default();
            if id.is_empty() {
                continue;
            }
            let name = c
                .names
                .as_ref()
                .and_then(|n| n.first())
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_else(|| id.clone());
            let image = c.image.as_ref().cloned().unwrap_or_default();
            let status = c.status.as_ref().cloned().unwrap_or_default();
            running_ids.push(id.clone());
            listed.insert(id, (name, image, status));
        }

        self.reconcile_streams(docker, &running_ids, &listed).await;

        let live = self.live_stats.read().await;
        let containers = running_ids
            .iter()
            .map(|id| {
                let (name, image, status) = listed[id].clone();
                let mut stat = live.get(id).cloned().unwrap_or_else(|| ContainerStat {
                    id: id.clone(),
                    name: name.clone(),
                    ..Default::default()
                });
                stat.image = image;
                stat.status = status;
                stat.running = true;
                stat
            })
            .collect();

        Ok(DockerReading {
            available: true,
            containers,
        })
    }

    /// Start stats streams for newly seen containers, abort streams for
    /// containers that are no longer running.
    async fn reconcile_streams(
        &self,
        docker: &Docker,
        running_ids: &[String],
        listed: &HashMap<String, (String, String, String)>,
    ) {
        let current_keys: Vec<String> = {
            let r = self.active_streams.read().await;
            r.keys().cloned().collect()
        };
        let running_set: HashSet<&String> = running_ids.iter().collect();

        let to_add: Vec<(String, String)> = running_ids
            .iter()
            .filter(|id| !current_keys.contains(id))
            .map(|id| {
                let name = listed
                    .get(id)
                    .map(|(name, _, _)| name.clone())
                    .unwrap_or_else(|| id.clone());
                (id.clone(), name)
            })
            .collect();
        let to_remove: Vec<String> = current_keys
            .into_iter()
            .filter(|id| !running_set.contains(id))
            .collect();

        let mut new_handles = Vec::with_capacity(to_add.len());
        for (id, name) in to_add {
            let handle = self.start_monitoring(docker, id.clone(), name);
            new_handles.push((id, handle));
        }

        {
            let mut streams = self.active_streams.write().await;
            for (id, handle) in new_handles {
                streams.insert(id, handle);
            }
            for id in &to_remove {
                if let Some(handle) = streams.remove(id) {
                    handle.abort();
                }
            }
        }
        if !to_remove.is_empty() {
            let mut live = self.live_stats.write().await;
            for id in &to_remove {
                live.remove(id);
            }
        }
    }

    fn start_monitoring(
        &self,
        docker: &Docker,
        id: String,
        name: String,
    ) -> tokio::task::JoinHandle<()> {
        let docker = docker.clone();
        let live_stats = self.live_stats.clone();
        let active_streams = self.active_streams.clone();

        tokio::spawn(async move {
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let mut stream = docker.stats(&id, Some(options));

            while let Some(result) = stream.next().await {
                match result {
                    Ok(s) => {
                        if let Some(stat) = stats::process_statistics(&s, &id, &name) {
                            live_stats.write().await.insert(id.clone(), stat);
                        }
                    }
                    Err(e) => {
                        warn!("stats stream error for container {}: {}", name, e);
                        break;
                    }
                }
            }
            active_streams.write().await.remove(&id);
        })
    }

    /// Container listing through the docker CLI with its own deadline; used
    /// when the socket API is unreachable.
    async fn collect_via_cli(&self, deadline: Duration) -> Result<DockerReading> {
        let check = Command::new("docker")
            .args(["info", "--format", "{{.ServerVersion}}"])
            .output();
        let available = matches!(
            tokio::time::timeout(CLI_CHECK_TIMEOUT.min(deadline), check).await,
            Ok(Ok(out)) if out.status.success()
        );
        if !available {
            return Ok(DockerReading::default());
        }

        let list = Command::new("docker")
            .args(["ps", "-a", "--format", "{{json .}}"])
            .output();
        let output = match tokio::time::timeout(CLI_LIST_TIMEOUT.min(deadline), list).await {
            Ok(Ok(out)) if out.status.success() => out.stdout,
            _ => {
                // Daemon reachable but listing failed (permissions?).
                return Ok(DockerReading {
                    available: true,
                    containers: Vec::new(),
                });
            }
        };

        #[derive(Deserialize)]
        struct CliContainer {
            #[serde(rename = "ID", default)]
            id: String,
            #[serde(rename = "Names", default)]
            names: String,
            #[serde(rename = "Image", default)]
            image: String,
            #[serde(rename = "Status", default)]
            status: String,
            #[serde(rename = "State", default)]
            state: String,
        }

        let containers = String::from_utf8_lossy(&output)
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str::<CliContainer>(line).ok())
            .map(|c| ContainerStat {
                id: c.id,
                name: c.names,
                image: c.image,
                running: c.state == "running",
                status: c.status,
                ..Default::default()
            })
            .collect();

        Ok(DockerReading {
            available: true,
            containers,
        })
    }
}

impl Sensor for DockerSensor {
    fn name(&self) -> &'static str {
        "docker"
    }

    async fn collect(&self, deadline: Duration) -> Result<SensorPayload> {
        let reading = match &self.docker {
            Some(docker) => match self.collect_via_socket(docker).await {
                Ok(reading) => reading,
                Err(_) => self.collect_via_cli(deadline).await?,
            },
            None => self.collect_via_cli(deadline).await?,
        };
        Ok(SensorPayload::Docker(reading))
    }
}
