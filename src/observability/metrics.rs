//! Metrics collection and exposition.
//!
//! # Metrics
//! - `tracked_invocations_total` (counter): calls by task and outcome
//! - `tracked_invocation_duration_seconds` (histogram): wrapped function latency
//! - `tracked_tracking_errors_total` (counter): failed reports by backend
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Labels are task name, outcome and backend; never argument values

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::instrument::Outcome;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_invocation(task: &str, outcome: Outcome, elapsed: Duration) {
    ::metrics::counter!(
        "tracked_invocations_total",
        "task" => task.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    ::metrics::histogram!("tracked_invocation_duration_seconds", "task" => task.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_tracking_error(backend: &'static str) {
    ::metrics::counter!("tracked_tracking_errors_total", "backend" => backend).increment(1);
}
