//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): inbound requests by route, status
//! - `relay_request_duration_seconds` (histogram): inbound latency
//! - `relay_admission_rejected_total` (counter): rejections by failed check
//! - `relay_upstream_calls_total` (counter): VRChat calls by op, outcome
//! - `relay_upstream_duration_seconds` (histogram): VRChat latency by op
//! - `relay_cooldown_wait_seconds` (histogram): time spent at the gate
//! - `relay_session_ready` (gauge): 1=authenticated, 0=not
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &str, status: u16, start: Instant) {
    let labels = [("route", route.to_string()), ("status", status.to_string())];
    counter!("relay_requests_total", &labels).increment(1);
    histogram!("relay_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_admission_rejected(check: &'static str) {
    counter!("relay_admission_rejected_total", "check" => check).increment(1);
}

pub fn record_upstream_call(op: &'static str, outcome: &str, start: Instant) {
    counter!("relay_upstream_calls_total", "op" => op, "outcome" => outcome.to_string()).increment(1);
    histogram!("relay_upstream_duration_seconds", "op" => op).record(start.elapsed().as_secs_f64());
}

pub fn record_cooldown_wait(wait: Duration) {
    histogram!("relay_cooldown_wait_seconds").record(wait.as_secs_f64());
}

pub fn record_session_ready(ready: bool) {
    gauge!("relay_session_ready").set(if ready { 1.0 } else { 0.0 });
}
