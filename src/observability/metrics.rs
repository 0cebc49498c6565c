//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define bridge metrics (events, handler failures, connection attempts)
//! - Expose Prometheus-compatible metrics endpoint (optional)
//!
//! # Metrics
//! - `lcu_events_received_total` (counter): frames decoded into events
//! - `lcu_frames_rejected_total` (counter): frames that failed to decode
//! - `lcu_events_dispatched_total` (counter): handler invocations scheduled
//! - `lcu_handler_failures_total` (counter): handlers that returned an error
//! - `lcu_connect_attempts_total` (counter): retry loop iterations by phase
//! - `lcu_event_channel_alive` (gauge): 1=receive loop running, 0=not
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade, a no-op until a recorder is installed
//! - The exporter is installed by the binaries, never by the library

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_event_received() {
    ::metrics::counter!("lcu_events_received_total").increment(1);
}

pub fn record_frame_rejected() {
    ::metrics::counter!("lcu_frames_rejected_total").increment(1);
}

pub fn record_event_dispatched(handlers: usize) {
    ::metrics::counter!("lcu_events_dispatched_total").increment(handlers as u64);
}

pub fn record_handler_failure() {
    ::metrics::counter!("lcu_handler_failures_total").increment(1);
}

/// Count one iteration of a start-up retry loop (`discovery` or `probe`).
pub fn record_connect_attempt(phase: &'static str) {
    ::metrics::counter!("lcu_connect_attempts_total", "phase" => phase).increment(1);
}

pub fn record_event_channel_alive(alive: bool) {
    ::metrics::gauge!("lcu_event_channel_alive").set(if alive { 1.0 } else { 0.0 });
}
