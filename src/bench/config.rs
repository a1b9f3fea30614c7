//! Configuration structs for benchmarking.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{BenchError, Result};

/// Number of shards the harness provisions. All records share one partition
/// key, so only a single shard is ever written or read.
pub const SHARD_COUNT: u32 = 1;

/// Largest batch Kinesis returns from a single `GetRecords` call
pub const MAX_READ_LIMIT: u32 = 10_000;

/// Configuration for the in-process mock log service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockServiceConfig {
    /// `describe_stream` calls that report no shards before the shard appears
    pub provisioning_polls: u32,
    /// Simulated latency per `put_record` call in milliseconds
    pub put_latency_ms: u64,
    /// Simulated latency per `get_records` call in milliseconds
    pub read_latency_ms: u64,
    /// Maximum records returned per `get_records` call
    pub batch_limit: usize,
    /// Random write error rate (0.0 to 1.0)
    pub error_rate: f64,
    /// Fail every `put_record` after this many successful writes
    pub fail_put_after: Option<u64>,
    /// Fail every `get_records` after this many successful reads
    pub fail_read_after: Option<u64>,
    /// Reject `delete_stream`
    pub fail_delete: bool,
}

impl Default for MockServiceConfig {
    fn default() -> Self {
        Self {
            provisioning_polls: 2,
            put_latency_ms: 0,
            read_latency_ms: 0,
            batch_limit: MAX_READ_LIMIT as usize,
            error_rate: 0.0,
            fail_put_after: None,
            fail_read_after: None,
            fail_delete: false,
        }
    }
}

/// Configuration for a benchmark run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Name of the stream to create (and delete) for this run
    pub stream_name: String,
    /// Append a random suffix to `stream_name`
    pub unique_stream_name: bool,
    /// Partition key shared by every record
    pub partition_key: String,
    /// Shards to provision
    pub shard_count: u32,
    /// Records to publish, rounded up to a multiple of `publisher_workers`
    pub iterations: u64,
    /// Concurrent publisher workers
    pub publisher_workers: usize,
    /// Delay between `describe_stream` polls in milliseconds
    pub poll_interval_ms: u64,
    /// Polls before provisioning gives up
    pub max_poll_attempts: u32,
    /// Records requested per `get_records` call (service default if unset)
    pub read_limit: Option<u32>,
    /// Upper bound on non-empty batches while draining
    pub max_read_batches: Option<u64>,
    /// Print a dot per provisioning poll
    pub show_progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            stream_name: "kinesis-test-rs".to_string(),
            unique_stream_name: false,
            partition_key: "only_one_shard".to_string(),
            shard_count: SHARD_COUNT,
            iterations: 200,
            publisher_workers: 3,
            poll_interval_ms: 1000,
            max_poll_attempts: 120,
            read_limit: None,
            max_read_batches: None,
            show_progress: true,
        }
    }
}

impl BenchmarkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Records that will actually be written once rounded up per worker.
    ///
    /// `None` when there are no workers or the rounded total overflows.
    pub fn total_records(&self) -> Option<u64> {
        super::publisher::records_per_worker(self.iterations, self.publisher_workers)?
            .checked_mul(self.publisher_workers as u64)
    }

    /// Stream name for a single run, with a random suffix when requested
    pub fn resolve_stream_name(&self) -> String {
        if self.unique_stream_name {
            let suffix = uuid::Uuid::new_v4().simple().to_string();
            format!("{}-{}", self.stream_name, &suffix[..8])
        } else {
            self.stream_name.clone()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.stream_name.trim().is_empty() {
            return Err(BenchError::Config("stream name cannot be empty".to_string()));
        }
        if self.partition_key.is_empty() {
            return Err(BenchError::Config(
                "partition key cannot be empty".to_string(),
            ));
        }
        if self.shard_count != SHARD_COUNT {
            return Err(BenchError::Config(format!(
                "shard count must be {SHARD_COUNT}, got {}",
                self.shard_count
            )));
        }
        if self.publisher_workers == 0 {
            return Err(BenchError::Config(
                "publisher workers must be at least 1".to_string(),
            ));
        }
        if self.total_records().is_none() {
            return Err(BenchError::Config(format!(
                "{} iterations cannot be rounded up across {} workers",
                self.iterations, self.publisher_workers
            )));
        }
        if self.max_poll_attempts == 0 {
            return Err(BenchError::Config(
                "max poll attempts must be at least 1".to_string(),
            ));
        }
        if let Some(limit) = self.read_limit {
            if limit == 0 || limit > MAX_READ_LIMIT {
                return Err(BenchError::Config(format!(
                    "read limit must be between 1 and {MAX_READ_LIMIT}, got {limit}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BenchmarkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.shard_count, 1);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_total_records_rounds_up() {
        let config = BenchmarkConfig {
            iterations: 10,
            publisher_workers: 3,
            ..Default::default()
        };
        assert_eq!(config.total_records(), Some(12));

        let config = BenchmarkConfig {
            iterations: 200,
            publisher_workers: 3,
            ..Default::default()
        };
        assert_eq!(config.total_records(), Some(201));
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = BenchmarkConfig {
            publisher_workers: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));
        assert_eq!(config.total_records(), None);
    }

    #[test]
    fn test_validate_rejects_overflowing_total() {
        let config = BenchmarkConfig {
            iterations: u64::MAX,
            publisher_workers: 2,
            ..Default::default()
        };
        assert_eq!(config.total_records(), None);
        assert!(matches!(config.validate(), Err(BenchError::Config(_))));

        // An exact multiple still fits
        let config = BenchmarkConfig {
            iterations: u64::MAX,
            publisher_workers: 1,
            ..Default::default()
        };
        assert_eq!(config.total_records(), Some(u64::MAX));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_multiple_shards() {
        let config = BenchmarkConfig {
            shard_count: 4,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: shard count must be 1, got 4");
    }

    #[test]
    fn test_validate_read_limit_bounds() {
        let config = BenchmarkConfig {
            read_limit: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BenchmarkConfig {
            read_limit: Some(MAX_READ_LIMIT + 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BenchmarkConfig {
            read_limit: Some(500),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_stream_name() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.resolve_stream_name(), "kinesis-test-rs");

        let config = BenchmarkConfig {
            unique_stream_name: true,
            ..Default::default()
        };
        let name = config.resolve_stream_name();
        assert!(name.starts_with("kinesis-test-rs-"));
        assert_eq!(name.len(), "kinesis-test-rs-".len() + 8);
        assert_ne!(name, config.resolve_stream_name());
    }
}
