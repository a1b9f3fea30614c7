// Error handling module
// Defines the failure taxonomy of a benchmark run

use thiserror::Error;

use crate::client::{ClientError, ShardId};

/// Errors that can abort a benchmark phase
#[derive(Error, Debug)]
pub enum BenchError {
    /// Stream creation was rejected
    #[error("Failed to create stream {stream}: {source}")]
    CreateStream {
        stream: String,
        #[source]
        source: ClientError,
    },

    /// Describing the stream failed while waiting for shards
    #[error("Failed to describe stream {stream}: {source}")]
    DescribeStream {
        stream: String,
        #[source]
        source: ClientError,
    },

    /// The stream never reported a shard within the polling budget
    #[error("Stream {stream} was not ready after {attempts} polls")]
    NotReadyInTime { stream: String, attempts: u32 },

    /// A publisher worker stopped on a failed write
    #[error("Publisher worker {worker} failed after {written} records: {source}")]
    Publish {
        worker: usize,
        written: u64,
        #[source]
        source: ClientError,
    },

    /// A publisher worker panicked or was cancelled
    #[error("Publisher worker did not complete: {0}")]
    WorkerJoin(#[from] tokio::task::JoinError),

    /// Obtaining the initial shard iterator failed
    #[error("Failed to open shard {shard_id}: {source}")]
    OpenCursor {
        shard_id: ShardId,
        #[source]
        source: ClientError,
    },

    /// A batch read failed while draining the shard
    #[error("Failed to read shard {shard_id} after {batches} batches: {source}")]
    Consume {
        shard_id: ShardId,
        batches: u64,
        #[source]
        source: ClientError,
    },

    /// The shard kept returning records past the configured batch limit
    #[error("Shard {shard_id} still returning records after {batches} batches")]
    DrainLimitExceeded { shard_id: ShardId, batches: u64 },

    /// Stream deletion failed
    #[error("Failed to delete stream {stream}: {source}")]
    Teardown {
        stream: String,
        #[source]
        source: ClientError,
    },

    /// The run was interrupted by a shutdown signal
    #[error("Benchmark interrupted")]
    Interrupted,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for benchmark operations
pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = BenchError::NotReadyInTime {
            stream: "bench".to_string(),
            attempts: 5,
        };
        assert_eq!(err.to_string(), "Stream bench was not ready after 5 polls");

        let err = BenchError::CreateStream {
            stream: "bench".to_string(),
            source: ClientError::StreamExists("bench".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to create stream bench: Stream already exists: bench"
        );

        let err = BenchError::Publish {
            worker: 2,
            written: 7,
            source: ClientError::Throttled,
        };
        assert_eq!(
            err.to_string(),
            "Publisher worker 2 failed after 7 records: Throughput exceeded"
        );
    }

    #[test]
    fn test_consume_error_message() {
        let err = BenchError::Consume {
            shard_id: ShardId::new("shardId-000000000000"),
            batches: 3,
            source: ClientError::ExpiredCursor,
        };
        assert_eq!(
            err.to_string(),
            "Failed to read shard shardId-000000000000 after 3 batches: Shard iterator expired"
        );
    }

    #[test]
    fn test_config_error_message() {
        let err = BenchError::Config("workers must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: workers must be positive"
        );
    }

    #[test]
    fn test_error_source_is_client_error() {
        use std::error::Error;

        let err = BenchError::Teardown {
            stream: "bench".to_string(),
            source: ClientError::StreamNotFound("bench".to_string()),
        };
        let source = err.source().expect("teardown error carries a source");
        assert_eq!(source.to_string(), "Stream not found: bench");
    }
}
