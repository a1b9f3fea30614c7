//! Concurrent record publishing.

use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;

use super::lifecycle::ReadyStream;
use super::metrics::MetricsCollector;
use super::report::{BenchmarkResult, Phase};
use crate::client::LogServiceClient;
use crate::error::{BenchError, Result};

/// Records each worker writes: `ceil(total_records / worker_count)`.
///
/// The total written is therefore rounded up to a multiple of `worker_count`.
/// Returns `None` for zero workers.
pub fn records_per_worker(total_records: u64, worker_count: usize) -> Option<u64> {
    if worker_count == 0 {
        return None;
    }
    Some(total_records.div_ceil(worker_count as u64))
}

/// Writes records from a fixed pool of workers, one blocking write at a time
/// per worker.
pub struct ConcurrentPublisher {
    client: Arc<dyn LogServiceClient>,
}

impl ConcurrentPublisher {
    pub fn new(client: Arc<dyn LogServiceClient>) -> Self {
        Self { client }
    }

    /// Publish `total_records` (rounded up) records with `worker_count`
    /// concurrent workers.
    ///
    /// Returns only once every worker has finished. If any worker failed, the
    /// first failure observed is returned; records already written stay in
    /// the stream.
    pub async fn publish(
        &self,
        stream: &ReadyStream,
        partition_key: &str,
        total_records: u64,
        worker_count: usize,
    ) -> Result<BenchmarkResult> {
        let per_worker = records_per_worker(total_records, worker_count).ok_or_else(|| {
            BenchError::Config("publisher workers must be at least 1".to_string())
        })?;
        let count = per_worker.checked_mul(worker_count as u64).ok_or_else(|| {
            BenchError::Config(format!(
                "{total_records} records cannot be rounded up across {worker_count} workers"
            ))
        })?;
        let stream_name: Arc<str> = Arc::from(stream.name());
        let partition_key: Arc<str> = Arc::from(partition_key);
        let metrics = Arc::new(MetricsCollector::new());

        let start = Instant::now();
        let mut workers = JoinSet::new();
        for worker in 0..worker_count {
            workers.spawn(publish_worker(
                Arc::clone(&self.client),
                Arc::clone(&stream_name),
                Arc::clone(&partition_key),
                Arc::clone(&metrics),
                worker,
                worker_count,
                per_worker,
            ));
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined.map_err(BenchError::from).and_then(|written| written) {
                tracing::warn!("Publisher worker failed: {}", err);
                first_error.get_or_insert(err);
            }
        }
        let elapsed = start.elapsed();

        if let Some(err) = first_error {
            return Err(err);
        }

        println!(
            "published {} records in {:.2} seconds",
            count,
            elapsed.as_secs_f64()
        );

        Ok(BenchmarkResult {
            phase: Phase::Publish,
            elapsed,
            count,
            calls: metrics.total_calls(),
            latency: metrics.summary(),
        })
    }
}

/// Write `records` records sequentially, stopping at the first failure
async fn publish_worker(
    client: Arc<dyn LogServiceClient>,
    stream: Arc<str>,
    partition_key: Arc<str>,
    metrics: Arc<MetricsCollector>,
    worker: usize,
    worker_count: usize,
    records: u64,
) -> Result<u64> {
    tracing::info!(
        "Publishing {} records on worker {}/{}",
        records,
        worker + 1,
        worker_count
    );

    for n in 0..records {
        let data = Bytes::from(format!("this is message {worker}/{n}"));
        let started = Instant::now();

        match client.put_record(&stream, &partition_key, data).await {
            Ok(_) => metrics.record_success(started.elapsed(), 1),
            Err(source) => {
                metrics.record_error();
                return Err(BenchError::Publish {
                    worker,
                    written: n,
                    source,
                });
            }
        }
    }

    tracing::debug!("Worker {} finished", worker + 1);
    Ok(records)
}
