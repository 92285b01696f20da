//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (results and durations per category)
//! - Request validation
//! - Batches and retention

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by input category and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fileforge_conversions_total", "Total conversions"),
        &["category", "result"], // "success", "unsupported_format", "backend_failure", ...
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fileforge_conversion_duration_seconds",
            "Duration of backend conversions",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["category"],
    )
    .unwrap()
});

/// Requests rejected before a job was created.
pub static VALIDATION_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "fileforge_validation_rejections_total",
            "Requests rejected by validation",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Batch & Retention Metrics
// =============================================================================

/// Batches submitted.
pub static BATCHES_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fileforge_batches_submitted_total", "Total batches submitted").unwrap()
});

/// Completed jobs removed by the retention sweeper.
pub static RETENTION_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fileforge_retention_evictions_total",
        "Completed jobs evicted by retention",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(VALIDATION_REJECTIONS.clone()),
        // Batch & retention
        Box::new(BATCHES_SUBMITTED.clone()),
        Box::new(RETENTION_EVICTIONS.clone()),
    ]
}
