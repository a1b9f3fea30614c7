//! Phase results and report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::metrics::LatencySummary;

/// Benchmark phase a result belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Publish,
    Consume,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Publish => write!(f, "publish"),
            Phase::Consume => write!(f, "consume"),
        }
    }
}

/// Outcome of one completed phase
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub phase: Phase,
    /// Wall-clock time for the whole phase
    pub elapsed: Duration,
    /// Records written or read
    pub count: u64,
    /// Service calls issued, including the final empty read when consuming
    pub calls: u64,
    pub latency: LatencySummary,
}

impl BenchmarkResult {
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.count as f64 / secs
    }
}

/// Results of a full publish/consume run
#[derive(Debug, Clone, PartialEq)]
pub struct RunResults {
    pub publish: BenchmarkResult,
    pub consume: BenchmarkResult,
}

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReport {
    pub stream_name: String,
    pub finished_at: DateTime<Utc>,
    pub phases: Vec<PhaseRow>,
    /// Whether every published record was read back
    pub complete: bool,
}

/// Report row for a single phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRow {
    pub phase: Phase,
    pub records: u64,
    pub calls: u64,
    pub elapsed_secs: f64,
    pub records_per_second: f64,
    pub latency_p50_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
}

impl From<&BenchmarkResult> for PhaseRow {
    fn from(result: &BenchmarkResult) -> Self {
        Self {
            phase: result.phase,
            records: result.count,
            calls: result.calls,
            elapsed_secs: result.elapsed.as_secs_f64(),
            records_per_second: result.records_per_second(),
            latency_p50_ms: result.latency.p50_ms,
            latency_p95_ms: result.latency.p95_ms,
            latency_p99_ms: result.latency.p99_ms,
        }
    }
}

impl BenchmarkReport {
    /// Create a report from a finished run
    pub fn from_results(stream_name: impl Into<String>, results: &RunResults) -> Self {
        Self {
            stream_name: stream_name.into(),
            finished_at: Utc::now(),
            phases: vec![
                PhaseRow::from(&results.publish),
                PhaseRow::from(&results.consume),
            ],
            complete: results.consume.count == results.publish.count,
        }
    }

    /// Print the report as an ASCII table
    pub fn print_table(&self) {
        println!();
        println!("╔══════════════════════════════════════════════════════════════════════════════╗");
        println!("║                         STREAM THROUGHPUT BENCHMARK                          ║");
        println!("╚══════════════════════════════════════════════════════════════════════════════╝");
        println!();
        println!("  Stream: {}", self.stream_name);
        println!();
        println!("┌──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐");
        println!("│  Phase   │ Records  │  Calls   │ Secs     │ Rec/s    │  p50(ms) │  p99(ms) │");
        println!("├──────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤");

        for row in &self.phases {
            println!(
                "│ {:<8} │ {:>8} │ {:>8} │ {:>8.2} │ {:>8.1} │ {:>8.1} │ {:>8.1} │",
                row.phase.to_string(),
                row.records,
                row.calls,
                row.elapsed_secs,
                row.records_per_second,
                row.latency_p50_ms,
                row.latency_p99_ms
            );
        }

        println!("└──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘");
        println!();

        if !self.complete {
            println!("Warning: consumed record count differs from published record count");
            println!();
        }
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
