//! Metrics collection and exposition.
//!
//! # Metrics
//! - `agent_requests_total` (counter): requests by agent, route, status
//! - `agent_request_duration_seconds` (histogram): handler latency
//! - `agent_outbound_calls_total` (counter): third-party calls by target, outcome

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram, Label};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a finished inbound request.
pub fn record_request(agent: &'static str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("agent", agent),
        Label::new("route", route.to_string()),
        Label::new("status", status.to_string()),
    ];
    counter!("agent_requests_total", labels.clone()).increment(1);
    histogram!("agent_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}

/// Record one attempt against a third-party API.
pub fn record_outbound(target: &'static str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!("agent_outbound_calls_total", "target" => target, "outcome" => outcome).increment(1);
}
