//! Sequential shard draining.

use std::sync::Arc;
use tokio::time::Instant;

use super::lifecycle::ReadyStream;
use super::metrics::MetricsCollector;
use super::report::{BenchmarkResult, Phase};
use crate::client::{LogServiceClient, StartingPosition};
use crate::error::{BenchError, Result};

/// Reads a shard from its trim horizon until the service returns an empty
/// batch. Each read depends on the cursor returned by the previous one, so
/// this phase is strictly sequential.
pub struct SequentialConsumer {
    client: Arc<dyn LogServiceClient>,
    read_limit: Option<u32>,
    max_batches: Option<u64>,
}

impl SequentialConsumer {
    pub fn new(client: Arc<dyn LogServiceClient>) -> Self {
        Self {
            client,
            read_limit: None,
            max_batches: None,
        }
    }

    /// Records requested per `get_records` call
    pub fn with_read_limit(mut self, read_limit: Option<u32>) -> Self {
        self.read_limit = read_limit;
        self
    }

    /// Fail instead of reading more than `max_batches` non-empty batches
    pub fn with_max_batches(mut self, max_batches: Option<u64>) -> Self {
        self.max_batches = max_batches;
        self
    }

    /// Drain the stream's shard, returning the record count and elapsed time.
    ///
    /// A read failure aborts the drain; the partial count is discarded.
    pub async fn consume(&self, stream: &ReadyStream) -> Result<BenchmarkResult> {
        let shard_id = stream.shard_id();
        let mut cursor = self
            .client
            .get_shard_iterator(stream.name(), shard_id, StartingPosition::TrimHorizon)
            .await
            .map_err(|source| BenchError::OpenCursor {
                shard_id: shard_id.clone(),
                source,
            })?;

        let metrics = MetricsCollector::new();
        let mut consumed: u64 = 0;
        let mut batches: u64 = 0;

        println!("starting consumption of shard {shard_id}");
        let start = Instant::now();

        loop {
            let started = Instant::now();
            let batch = match self.client.get_records(&cursor, self.read_limit).await {
                Ok(batch) => batch,
                Err(source) => {
                    metrics.record_error();
                    return Err(BenchError::Consume {
                        shard_id: shard_id.clone(),
                        batches,
                        source,
                    });
                }
            };

            let Some(batch) = batch.filter(|b| !b.records.is_empty()) else {
                metrics.record_success(started.elapsed(), 0);
                break;
            };

            if self.max_batches.is_some_and(|max| batches >= max) {
                return Err(BenchError::DrainLimitExceeded {
                    shard_id: shard_id.clone(),
                    batches,
                });
            }

            let size = batch.records.len() as u64;
            metrics.record_success(started.elapsed(), size);
            consumed += size;
            batches += 1;
            tracing::debug!("Read batch {} with {} records", batches, size);

            match batch.next_cursor {
                Some(next) => cursor = next,
                None => {
                    tracing::debug!("Shard {} is closed", shard_id);
                    break;
                }
            }
        }

        let elapsed = start.elapsed();
        println!(
            "consumed {} records in {:.2} seconds",
            consumed,
            elapsed.as_secs_f64()
        );

        Ok(BenchmarkResult {
            phase: Phase::Consume,
            elapsed,
            count: consumed,
            calls: metrics.total_calls(),
            latency: metrics.summary(),
        })
    }
}
