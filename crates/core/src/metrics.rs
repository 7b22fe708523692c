//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Command dispatch and authorization
//! - Relocation (requests, per-file outcomes, duration)
//! - Interactive sessions
//! - Torrent daemon requests

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Dispatch
// =============================================================================

/// Commands handled by command name and result.
pub static COMMANDS_HANDLED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("courier_commands_total", "Total chat commands handled"),
        &["command", "result"], // result: "ok", "usage", "error", "rejected"
    )
    .unwrap()
});

/// Messages rejected by the authorization gate.
pub static AUTH_DENIALS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "courier_auth_denials_total",
        "Messages rejected by the authorization gate",
    )
    .unwrap()
});

// =============================================================================
// Relocation
// =============================================================================

/// Relocation requests by result.
pub static RELOCATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("courier_relocations_total", "Total relocation requests"),
        &["result"], // "completed", "partial", "no_matches", "destination_not_found", "listing_unavailable", "invalid_request"
    )
    .unwrap()
});

/// Files moved successfully.
pub static FILES_MOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("courier_files_moved_total", "Total files moved").unwrap()
});

/// Files whose move failed, by reason.
pub static FILES_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("courier_files_failed_total", "Total files that failed to move"),
        &["reason"],
    )
    .unwrap()
});

/// Relocation duration in seconds (planning plus execution).
pub static RELOCATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "courier_relocation_duration_seconds",
            "Duration of relocation requests",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 600.0]),
        &["mode"], // "inline", "interactive"
    )
    .unwrap()
});

// =============================================================================
// Interactive sessions
// =============================================================================

/// Interactive session transitions.
pub static SESSION_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "courier_session_transitions_total",
            "Interactive move session transitions",
        ),
        &["event"], // "started", "superseded", "pattern", "completed", "cancelled"
    )
    .unwrap()
});

// =============================================================================
// Torrent daemon
// =============================================================================

/// Failed daemon requests by kind.
pub static DAEMON_REQUEST_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "courier_daemon_request_errors_total",
            "Failed torrent daemon requests",
        ),
        &["kind"], // "transport", "not_found", "forbidden", "http"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Dispatch
        Box::new(COMMANDS_HANDLED.clone()),
        Box::new(AUTH_DENIALS.clone()),
        // Relocation
        Box::new(RELOCATIONS_TOTAL.clone()),
        Box::new(FILES_MOVED.clone()),
        Box::new(FILES_FAILED.clone()),
        Box::new(RELOCATION_DURATION.clone()),
        // Sessions
        Box::new(SESSION_TRANSITIONS.clone()),
        // Daemon
        Box::new(DAEMON_REQUEST_ERRORS.clone()),
    ]
}
