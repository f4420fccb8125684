//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Query cache fetches (results, duration)
//! - Request de-duplication
//! - Results discarded after teardown or invalidation

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Query Cache Metrics
// =============================================================================

/// Loader runs by result.
pub static CACHE_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("filmcat_cache_fetches_total", "Total loader runs"),
        &["key", "result"], // "success", "error"
    )
    .unwrap()
});

/// Loader duration in seconds.
pub static CACHE_FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "filmcat_cache_fetch_duration_seconds",
            "Duration of a loader run",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["key"],
    )
    .unwrap()
});

/// Callers that attached to an already running fetch.
pub static CACHE_DEDUP_JOINS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "filmcat_cache_dedup_joins_total",
            "Fetch requests served by an in-flight load",
        ),
        &["key"],
    )
    .unwrap()
});

/// Results that arrived for a torn down or superseded entry.
pub static CACHE_DISCARDED_RESULTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "filmcat_cache_discarded_results_total",
        "Loader results dropped because their entry was gone",
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CACHE_FETCHES.clone()),
        Box::new(CACHE_FETCH_DURATION.clone()),
        Box::new(CACHE_DEDUP_JOINS.clone()),
        Box::new(CACHE_DISCARDED_RESULTS.clone()),
    ]
}
