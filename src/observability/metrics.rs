//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_monitor_connects_total` (counter): connection attempts by endpoint, outcome
//! - `agent_notifications_total` (counter): subscription items by kind
//! - `agent_reconciliations_total` (counter): reconcile results by pool, outcome
//! - `agent_reloads_total` (counter): proxy reloads by outcome
//! - `agent_loop_state` (gauge): 0=starting, 1=subscribed, 2=reconnecting, 3=terminated

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside the tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_monitor_connect(endpoint: &str, success: bool) {
    let outcome = if success { "connected" } else { "failed" };
    ::metrics::counter!(
        "agent_monitor_connects_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_notification(kind: &'static str) {
    ::metrics::counter!("agent_notifications_total", "kind" => kind).increment(1);
}

pub fn record_reconcile(pool: &str, outcome: &'static str) {
    ::metrics::counter!(
        "agent_reconciliations_total",
        "pool" => pool.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_reload(success: bool) {
    let outcome = if success { "ok" } else { "failed" };
    ::metrics::counter!("agent_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_loop_state(state: u8) {
    ::metrics::gauge!("agent_loop_state").set(state as f64);
}
