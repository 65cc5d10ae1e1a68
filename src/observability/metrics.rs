//! Metrics collection and exposition.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and exposition endpoint.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!("metrics server listening on http://{}", addr);
}

/// Record a heartbeat outcome for a host.
pub fn record_host_health(cluster: &str, host: &str, healthy: bool) {
    let val = if healthy { 1.0 } else { 0.0 };
    gauge!(
        "host_health",
        "cluster" => cluster.to_string(),
        "host" => host.to_string()
    )
    .set(val);
}

/// Count a penalty applied to a host after a failed interaction.
pub fn record_host_penalty(host: &str) {
    counter!("host_penalties", "host" => host.to_string()).increment(1);
}
