//! Metrics collection and export for Tally.
//!
//! Uses the `metrics` crate for instrumentation and exports
//! to Prometheus format.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tally_protocol::EventType;
use tracing::info;

/// Metric names.
pub mod names {
    pub const EVENTS_TOTAL: &str = "tally_events_total";
    pub const DECODE_ERRORS_TOTAL: &str = "tally_decode_errors_total";
    pub const DISPATCH_SECONDS: &str = "tally_dispatch_seconds";
    pub const FLUSHES_TOTAL: &str = "tally_flushes_total";
}

/// Initialize the metrics system.
pub fn init_metrics() {
    metrics::describe_counter!(names::EVENTS_TOTAL, "Total number of events dispatched");
    metrics::describe_counter!(
        names::DECODE_ERRORS_TOTAL,
        "Total number of malformed frames read from the host"
    );
    metrics::describe_histogram!(
        names::DISPATCH_SECONDS,
        "Time spent routing one event, in seconds"
    );
    metrics::describe_counter!(names::FLUSHES_TOTAL, "Total number of vendor flushes");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics server.
///
/// # Errors
///
/// Returns an error if the server cannot be started.
pub fn start_metrics_server(port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a dispatched event and how long routing took.
pub fn record_event(event_type: EventType, seconds: f64) {
    counter!(names::EVENTS_TOTAL, "type" => event_type.as_str()).increment(1);
    histogram!(names::DISPATCH_SECONDS).record(seconds);
}

/// Record a malformed frame.
pub fn record_decode_error() {
    counter!(names::DECODE_ERRORS_TOTAL).increment(1);
}

/// Record a vendor flush.
pub fn record_flush() {
    counter!(names::FLUSHES_TOTAL).increment(1);
}
