//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - HTTP request latency histograms
//! - Chat activity counters (rooms created, messages sent, reactions)
//! - Signaling relay subscribers, relayed frames and dropped subscribers

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

const NAMESPACE: &str = "chat_backend";

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace(NAMESPACE),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// HTTP request latency histogram - tracks request duration in seconds
pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let buckets = vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
    HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        )
        .namespace(NAMESPACE)
        .buckets(buckets),
        &["method", "path"],
    )
    .expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric")
});

/// Rooms created, by type
pub static ROOMS_CREATED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("rooms_created_total", "Rooms created").namespace(NAMESPACE),
        &["type"],
    )
    .expect("Failed to create ROOMS_CREATED_TOTAL metric")
});

/// Messages stored, by message type
pub static MESSAGES_SENT_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_sent_total", "Messages stored").namespace(NAMESPACE),
        &["type"],
    )
    .expect("Failed to create MESSAGES_SENT_TOTAL metric")
});

/// Connected signaling subscribers across all calls
pub static SIGNALING_SUBSCRIBERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::with_opts(
        Opts::new("signaling_subscribers", "Connected signaling subscribers").namespace(NAMESPACE),
    )
    .expect("Failed to create SIGNALING_SUBSCRIBERS metric")
});

/// Signaling frames delivered to subscribers
pub static SIGNALING_FRAMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("signaling_frames_total", "Signaling frames delivered").namespace(NAMESPACE),
        &["kind"],
    )
    .expect("Failed to create SIGNALING_FRAMES_TOTAL metric")
});

/// Subscribers disconnected because their outbound queue was full
pub static SIGNALING_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::with_opts(
        Opts::new(
            "signaling_dropped_subscribers_total",
            "Signaling subscribers dropped for falling behind",
        )
        .namespace(NAMESPACE),
    )
    .expect("Failed to create SIGNALING_DROPPED_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()),
        Box::new(ROOMS_CREATED_TOTAL.clone()),
        Box::new(MESSAGES_SENT_TOTAL.clone()),
        Box::new(SIGNALING_SUBSCRIBERS.clone()),
        Box::new(SIGNALING_FRAMES_TOTAL.clone()),
        Box::new(SIGNALING_DROPPED_TOTAL.clone()),
    ];
    for collector in collectors {
        if let Err(e) = registry.register(collector) {
            tracing::error!(error = %e, "Failed to register metric");
        }
    }
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record HTTP request metrics
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

pub fn record_room_created(room_type: &str) {
    ROOMS_CREATED_TOTAL.with_label_values(&[room_type]).inc();
}

pub fn record_message_sent(message_type: &str) {
    MESSAGES_SENT_TOTAL.with_label_values(&[message_type]).inc();
}

pub fn record_signaling_frame(kind: &str) {
    SIGNALING_FRAMES_TOTAL.with_label_values(&[kind]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_includes_recorded_metrics() {
        record_http_request("GET", "/api/v1/rooms", 200, 0.01);
        record_message_sent("TEXT");
        SIGNALING_SUBSCRIBERS.inc();
        SIGNALING_SUBSCRIBERS.dec();

        let output = gather_metrics();
        assert!(output.contains("chat_backend_http_requests_total"));
        assert!(output.contains("chat_backend_messages_sent_total"));
        assert!(output.contains("chat_backend_signaling_subscribers"));
    }
}
