//! Prometheus metrics for the bot process.
//!
//! The registry holds the core metrics (commands, relocations, sessions,
//! daemon errors) plus the process-level ones defined here:
//! - HTTP request metrics for the health endpoint
//! - Telegram polling metrics

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "courier_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("courier_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "courier_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Polling Metrics
// =============================================================================

/// Telegram updates received, by kind.
pub static UPDATES_RECEIVED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("courier_updates_received_total", "Telegram updates received"),
        &["kind"], // "text", "ignored"
    )
    .unwrap()
});

/// Failed `getUpdates` calls.
pub static POLL_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("courier_poll_errors_total", "Failed Telegram poll requests").unwrap()
});

/// Current poll backoff delay in seconds (0 when healthy).
pub static POLL_BACKOFF_SECONDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "courier_poll_backoff_seconds",
        "Current delay before the next poll after failures",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Polling
    registry
        .register(Box::new(UPDATES_RECEIVED.clone()))
        .unwrap();
    registry.register(Box::new(POLL_ERRORS.clone())).unwrap();
    registry
        .register(Box::new(POLL_BACKOFF_SECONDS.clone()))
        .unwrap();

    // Core metrics (dispatch, relocation, sessions, daemon)
    for metric in courier_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
