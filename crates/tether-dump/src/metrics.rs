//! Metrics collection and export for the dump tool.
//!
//! Uses the `metrics` crate for instrumentation and optionally exports
//! to Prometheus format.

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tether_protocol::Frame;
use tracing::info;

/// Metric names.
pub mod names {
    pub const FRAMES_TOTAL: &str = "tether_frames_total";
    pub const PAYLOAD_BYTES: &str = "tether_payload_bytes_total";
    pub const ERRORS_TOTAL: &str = "tether_errors_total";
}

/// Describe all metrics.
pub fn init_metrics() {
    metrics::describe_counter!(names::FRAMES_TOTAL, "Total number of frames decoded");
    metrics::describe_counter!(names::PAYLOAD_BYTES, "Total payload bytes decoded");
    metrics::describe_counter!(names::ERRORS_TOTAL, "Total number of framer errors");

    info!("Metrics initialized");
}

/// Start the Prometheus metrics exporter.
///
/// # Errors
///
/// Returns an error if the exporter cannot be installed.
pub fn start_metrics_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", port).parse()?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    info!("Metrics server listening on {}", addr);
    Ok(())
}

/// Record a decoded frame.
pub fn record_frame(frame: &Frame) {
    let cmd = format!("0x{:02x}", frame.cmd_type());
    counter!(names::FRAMES_TOTAL, "cmd_type" => cmd).increment(1);
    counter!(names::PAYLOAD_BYTES).increment(frame.data.len() as u64);
}

/// Record a framer error.
pub fn record_error(error_type: &'static str) {
    counter!(names::ERRORS_TOTAL, "type" => error_type).increment(1);
}
