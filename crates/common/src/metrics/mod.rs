//! Metrics and observability utilities
//!
//! Counters for each ingestion stage plus read-API request metrics,
//! following one naming convention.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all Blooters metrics
pub const METRICS_PREFIX: &str = "blooters";

/// Buckets for request latency (in seconds)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

fn status_label(success: bool) -> &'static str {
    if success { "success" } else { "error" }
}

/// Register all metric descriptions
pub fn register_metrics() {
    // Request metrics
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    // Ingestion metrics
    describe_counter!(
        format!("{}_goals_fetch_total", METRICS_PREFIX),
        Unit::Count,
        "Feed fetch cycles by outcome"
    );

    describe_counter!(
        format!("{}_goals_parsed_total", METRICS_PREFIX),
        Unit::Count,
        "Goal titles parsed successfully"
    );

    describe_counter!(
        format!("{}_titles_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Candidate titles that did not parse as a goal"
    );

    describe_histogram!(
        format!("{}_ingestion_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Duration of one poll cycle in seconds"
    );

    // Store metrics
    describe_counter!(
        format!("{}_goals_store_total", METRICS_PREFIX),
        Unit::Count,
        "Store passes by outcome"
    );

    describe_counter!(
        format!("{}_goal_rows_total", METRICS_PREFIX),
        Unit::Count,
        "Goal rows by insert outcome"
    );

    // Enrichment metrics
    describe_counter!(
        format!("{}_mirrors_populate_total", METRICS_PREFIX),
        Unit::Count,
        "Mirrors lookups by outcome"
    );

    // Retention metrics
    describe_counter!(
        format!("{}_remove_old_goals_total", METRICS_PREFIX),
        Unit::Count,
        "Retention sweeps by outcome"
    );

    describe_gauge!(
        format!("{}_games_removed_last", METRICS_PREFIX),
        Unit::Count,
        "Games deleted by the last retention sweep"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record the outcome of one feed fetch + parse pass
pub fn record_fetch(success: bool, parsed: usize, skipped: usize, duration_secs: f64) {
    counter!(
        format!("{}_goals_fetch_total", METRICS_PREFIX),
        "status" => status_label(success)
    )
    .increment(1);

    if !success {
        return;
    }

    counter!(format!("{}_goals_parsed_total", METRICS_PREFIX)).increment(parsed as u64);
    counter!(format!("{}_titles_skipped_total", METRICS_PREFIX)).increment(skipped as u64);
    histogram!(format!("{}_ingestion_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}

/// Record the outcome of one store pass
pub fn record_store(success: bool, inserted: usize, duplicates: usize, failed: usize) {
    counter!(
        format!("{}_goals_store_total", METRICS_PREFIX),
        "status" => status_label(success)
    )
    .increment(1);

    for (outcome, count) in [("inserted", inserted), ("duplicate", duplicates), ("failed", failed)] {
        counter!(
            format!("{}_goal_rows_total", METRICS_PREFIX),
            "outcome" => outcome
        )
        .increment(count as u64);
    }
}

/// Record mirrors lookups: `found` links out of `attempted` threads
pub fn record_aux_links(attempted: usize, found: usize) {
    counter!(
        format!("{}_mirrors_populate_total", METRICS_PREFIX),
        "status" => "success"
    )
    .increment(found as u64);

    counter!(
        format!("{}_mirrors_populate_total", METRICS_PREFIX),
        "status" => "error"
    )
    .increment(attempted.saturating_sub(found) as u64);
}

/// Record a retention sweep
pub fn record_retention(success: bool, removed: u64) {
    counter!(
        format!("{}_remove_old_goals_total", METRICS_PREFIX),
        "status" => status_label(success)
    )
    .increment(1);

    if success {
        gauge!(format!("{}_games_removed_last", METRICS_PREFIX)).set(removed as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every helper must be a no-op
        record_fetch(true, 3, 1, 0.2);
        record_fetch(false, 0, 0, 0.0);
        record_store(true, 2, 1, 0);
        record_aux_links(4, 1);
        record_retention(true, 2);
        RequestMetrics::start("GET", "/api/games").finish(200);
    }
}
