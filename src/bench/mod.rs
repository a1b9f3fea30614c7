//! Benchmark module for log stream throughput testing.
//!
//! This module provides:
//! - Stream lifecycle management (create, wait for shard, delete)
//! - Concurrent publisher and sequential consumer phases
//! - A runner that guarantees teardown on every exit path
//! - HdrHistogram-based call latency metrics
//! - An in-memory mock log service
//! - Report generation

pub mod config;
pub mod consumer;
pub mod lifecycle;
pub mod metrics;
pub mod mock_service;
pub mod publisher;
pub mod report;
pub mod runner;

pub use config::{BenchmarkConfig, MockServiceConfig};
pub use consumer::SequentialConsumer;
pub use lifecycle::{ReadyStream, StreamLifecycleManager, StreamState};
pub use metrics::{LatencySummary, MetricsCollector};
pub use mock_service::{CallStats, MockLogService};
pub use publisher::{records_per_worker, ConcurrentPublisher};
pub use report::{BenchmarkReport, BenchmarkResult, Phase, RunResults};
pub use runner::BenchmarkRunner;
