//! Log service client abstraction.
//!
//! The harness never talks to a log service directly. Everything goes through
//! [`LogServiceClient`], which is implemented by:
//! - [`crate::bench::MockLogService`] - an in-process service for tests and dry runs
//! - `kinesis::KinesisLogClient` - AWS Kinesis (feature `kinesis`)

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "kinesis")]
pub mod kinesis;

/// Opaque shard identifier assigned by the log service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShardId(String);

impl ShardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque read position within a shard (a shard iterator)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Where a new cursor starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartingPosition {
    /// Oldest record still retained by the shard
    #[default]
    TrimHorizon,
    /// Just after the most recent record
    Latest,
}

/// Provisioning status reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Creating,
    Active,
    Updating,
    Deleting,
}

/// Result of a `describe_stream` call
#[derive(Debug, Clone)]
pub struct StreamDescription {
    pub status: StreamStatus,
    /// Empty until the service has provisioned the shards
    pub shards: Vec<ShardId>,
}

/// A single record read back from a shard
#[derive(Debug, Clone)]
pub struct Record {
    pub partition_key: String,
    pub data: Bytes,
    pub sequence_number: String,
}

/// One batch returned by `get_records`
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    /// `None` once the shard has been closed
    pub next_cursor: Option<Cursor>,
}

/// Acknowledgement of a `put_record` call
#[derive(Debug, Clone)]
pub struct PutRecordOutput {
    pub shard_id: ShardId,
    pub sequence_number: String,
}

/// Errors surfaced by a log service client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Stream not found: {0}")]
    StreamNotFound(String),

    #[error("Stream already exists: {0}")]
    StreamExists(String),

    #[error("Throughput exceeded")]
    Throttled,

    #[error("Shard iterator expired")]
    ExpiredCursor,

    #[error("Invalid shard iterator: {0}")]
    InvalidCursor(String),

    #[error("Log service error: {0}")]
    Service(String),
}

/// Operations the harness needs from a partitioned log service.
///
/// Implementations must be safe to share between publisher workers; every
/// call is an independent request/response.
#[async_trait]
pub trait LogServiceClient: Send + Sync {
    /// Start provisioning a stream. Fails if the stream already exists.
    async fn create_stream(&self, name: &str, shard_count: u32) -> Result<(), ClientError>;

    async fn describe_stream(&self, name: &str) -> Result<StreamDescription, ClientError>;

    async fn delete_stream(&self, name: &str) -> Result<(), ClientError>;

    /// Append one record. Resolves once the service has acknowledged it.
    async fn put_record(
        &self,
        stream: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<PutRecordOutput, ClientError>;

    async fn get_shard_iterator(
        &self,
        stream: &str,
        shard_id: &ShardId,
        position: StartingPosition,
    ) -> Result<Cursor, ClientError>;

    /// Read the batch at `cursor`. An empty batch (or `None`) means the
    /// reader has caught up with the end of the shard.
    async fn get_records(
        &self,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<Option<RecordBatch>, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_messages() {
        let err = ClientError::StreamExists("bench".to_string());
        assert_eq!(err.to_string(), "Stream already exists: bench");

        let err = ClientError::StreamNotFound("bench".to_string());
        assert_eq!(err.to_string(), "Stream not found: bench");

        let err = ClientError::Service("boom".to_string());
        assert_eq!(err.to_string(), "Log service error: boom");
    }

    #[test]
    fn test_default_starting_position() {
        assert_eq!(StartingPosition::default(), StartingPosition::TrimHorizon);
    }

    #[test]
    fn test_shard_id_display() {
        let id = ShardId::new("shardId-000000000000");
        assert_eq!(id.to_string(), "shardId-000000000000");
        assert_eq!(id.as_str(), "shardId-000000000000");
    }
}
