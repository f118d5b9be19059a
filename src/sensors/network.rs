// Interface counters (fast tier) and connectivity probe (slow tier)

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use sysinfo::Networks;

use super::{Sensor, SensorPayload, linux};
use crate::models::{ConnectivityReading, NetInterfaceCounters, NetReading};

pub struct NetSensor {
    networks: Arc<Mutex<Networks>>,
}

impl NetSensor {
    pub(crate) fn new() -> Self {
        Self {
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
        }
    }
}

impl Sensor for NetSensor {
    fn name(&self) -> &'static str {
        "network"
    }

    async fn collect(&self, _deadline: Duration) -> Result<SensorPayload> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks = networks
                .lock()
                .map_err(|e| anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks.refresh(true);

            let interfaces = networks
                .list()
                .iter()
                .map(|(name, data)| {
                    let (drop_in, drop_out) = linux::read_dropped(name);
                    NetInterfaceCounters {
                        name: name.clone(),
                        bytes_sent: data.total_transmitted(),
                        bytes_recv: data.total_received(),
                        packets_sent: data.total_packets_transmitted(),
                        packets_recv: data.total_packets_received(),
                        err_in: data.total_errors_on_received(),
                        err_out: data.total_errors_on_transmitted(),
                        drop_in,
                        drop_out,
                    }
                })
                .collect();

            Ok(SensorPayload::Network(NetReading { interfaces }))
        })
        .await
        .map_err(|e| anyhow!("sensor task join: {}", e))?
    }
}

/// Outbound TCP dial to a configured endpoint plus the active TCP connection
/// count. Unreachable endpoints are a reading (offline), not an error.
pub struct ConnectivitySensor {
    endpoint: String,
    probe_timeout: Duration,
}

impl ConnectivitySensor {
    pub(crate) fn new(endpoint: String, probe_timeout: Duration) -> Self {
        Self {
            endpoint,
            probe_timeout,
        }
    }
}

impl Sensor for ConnectivitySensor {
    fn name(&self) -> &'static str {
        "connectivity"
    }

    async fn collect(&self, deadline: Duration) -> Result<SensorPayload> {
        let dial_timeout = self.probe_timeout.min(deadline);
        let start = Instant::now();
        let connected = matches!(
            tokio::time::timeout(dial_timeout, tokio::net::TcpStream::connect(&self.endpoint))
                .await,
            Ok(Ok(_))
        );
        let latency_ms = if connected {
            start.elapsed().as_secs_f64() * 1000.0
        } else {
            0.0
        };

        let active_tcp = tokio::task::spawn_blocking(linux::count_tcp_connections)
            .await
            .map_err(|e| anyhow!("sensor task join: {}", e))?;

        Ok(SensorPayload::Connectivity(ConnectivityReading {
            latency_ms,
            is_connected: connected,
            active_tcp,
        }))
    }
}
