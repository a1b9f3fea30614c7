//! Benchmark runner: provision, publish, consume, and always tear down.

use std::future::Future;
use std::sync::Arc;

use super::config::BenchmarkConfig;
use super::consumer::SequentialConsumer;
use super::lifecycle::StreamLifecycleManager;
use super::publisher::ConcurrentPublisher;
use super::report::RunResults;
use crate::client::{ClientError, LogServiceClient};
use crate::error::{BenchError, Result};

/// Benchmark runner that executes one full run against a log service
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    client: Arc<dyn LogServiceClient>,
}

impl BenchmarkRunner {
    /// Create a new benchmark runner
    pub fn new(config: BenchmarkConfig, client: Arc<dyn LogServiceClient>) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Run the benchmark against a stream named by the configuration
    pub async fn run(&self) -> Result<RunResults> {
        let stream_name = self.config.resolve_stream_name();
        self.run_with_shutdown(&stream_name, std::future::pending())
            .await
    }

    /// Run the benchmark, stopping early when `shutdown` resolves.
    ///
    /// The stream is deleted on every exit path. An error from an earlier
    /// phase takes precedence over a teardown error, which is then only logged.
    pub async fn run_with_shutdown(
        &self,
        stream_name: &str,
        shutdown: impl Future<Output = ()>,
    ) -> Result<RunResults> {
        self.config.validate()?;

        let mut lifecycle = StreamLifecycleManager::new(
            Arc::clone(&self.client),
            self.config.poll_interval(),
            self.config.max_poll_attempts,
        )
        .with_progress(self.config.show_progress);

        let outcome = tokio::select! {
            outcome = self.run_phases(&mut lifecycle, stream_name) => outcome,
            _ = shutdown => {
                tracing::warn!("Shutdown requested, abandoning benchmark run");
                Err(BenchError::Interrupted)
            }
        };

        if found_preexisting_stream(&outcome) {
            tracing::warn!(
                "Stream {} existed before this run; deleting it anyway",
                stream_name
            );
        }
        let teardown = lifecycle.teardown(stream_name).await;

        match (outcome, teardown) {
            (Ok(results), Ok(())) => Ok(results),
            (Ok(_), Err(teardown_err)) => Err(teardown_err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(teardown_err)) => {
                tracing::error!(
                    "Teardown also failed after run error ({}): {}",
                    err,
                    teardown_err
                );
                Err(err)
            }
        }
    }

    async fn run_phases(
        &self,
        lifecycle: &mut StreamLifecycleManager,
        stream_name: &str,
    ) -> Result<RunResults> {
        let stream = lifecycle
            .provision(stream_name, self.config.shard_count)
            .await?;

        let publish = ConcurrentPublisher::new(Arc::clone(&self.client))
            .publish(
                &stream,
                &self.config.partition_key,
                self.config.iterations,
                self.config.publisher_workers,
            )
            .await?;

        let consume = SequentialConsumer::new(Arc::clone(&self.client))
            .with_read_limit(self.config.read_limit)
            .with_max_batches(self.config.max_read_batches)
            .consume(&stream)
            .await?;

        if consume.count != publish.count {
            tracing::warn!(
                "Consumed {} records but published {}",
                consume.count,
                publish.count
            );
        }

        Ok(RunResults { publish, consume })
    }
}

/// Whether the run stopped because the stream name was already taken
fn found_preexisting_stream(outcome: &Result<RunResults>) -> bool {
    matches!(
        outcome,
        Err(BenchError::CreateStream {
            source: ClientError::StreamExists(_),
            ..
        })
    )
}
