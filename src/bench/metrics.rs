//! Metrics collection using HdrHistogram for accurate percentile calculations.

use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Thread-safe per-call metrics for one benchmark phase
pub struct MetricsCollector {
    /// Histogram for service call latency (microseconds)
    latency_histogram: Mutex<Histogram<u64>>,
    /// Total successful calls
    success_count: AtomicU64,
    /// Total failed calls
    error_count: AtomicU64,
    /// Total records moved by successful calls
    records: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            // Latencies up to 10 minutes with 3 significant figures
            latency_histogram: Mutex::new(
                Histogram::new_with_bounds(1, 600_000_000, 3)
                    .expect("static histogram bounds are valid"),
            ),
            success_count: AtomicU64::new(0),
            error_count: AtomicU64::new(0),
            records: AtomicU64::new(0),
        }
    }

    /// Record a successful call that moved `records` records
    pub fn record_success(&self, latency: Duration, records: u64) {
        let latency_us = latency.as_micros() as u64;
        if let Ok(mut hist) = self.latency_histogram.lock() {
            let _ = hist.record(latency_us.max(1));
        }

        self.success_count.fetch_add(1, Ordering::Relaxed);
        self.records.fetch_add(records, Ordering::Relaxed);
    }

    /// Record a failed call
    pub fn record_error(&self) {
        self.error_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn success_count(&self) -> u64 {
        self.success_count.load(Ordering::Relaxed)
    }

    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Total calls issued, successful or not
    pub fn total_calls(&self) -> u64 {
        self.success_count() + self.error_count()
    }

    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Get latency percentile in milliseconds
    pub fn latency_percentile(&self, percentile: f64) -> f64 {
        match self.latency_histogram.lock() {
            Ok(hist) if !hist.is_empty() => hist.value_at_percentile(percentile) as f64 / 1000.0,
            _ => 0.0,
        }
    }

    /// Summarize call latency
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            p50_ms: self.latency_percentile(50.0),
            p95_ms: self.latency_percentile(95.0),
            p99_ms: self.latency_percentile(99.0),
            errors: self.error_count(),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Call latency percentiles for a phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    /// Failed calls observed before the phase ended
    pub errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector() {
        let collector = MetricsCollector::new();

        collector.record_success(Duration::from_millis(100), 5);
        collector.record_success(Duration::from_millis(150), 5);
        collector.record_success(Duration::from_millis(200), 0);
        collector.record_error();

        assert_eq!(collector.success_count(), 3);
        assert_eq!(collector.error_count(), 1);
        assert_eq!(collector.total_calls(), 4);
        assert_eq!(collector.records(), 10);

        let summary = collector.summary();
        assert!((summary.p50_ms - 150.0).abs() < 1.0);
        assert!(summary.p99_ms >= summary.p50_ms);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_empty_collector_summary() {
        let collector = MetricsCollector::new();
        assert_eq!(collector.summary(), LatencySummary::default());
    }
}
