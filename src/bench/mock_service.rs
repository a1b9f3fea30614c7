//! In-process mock log service for tests and dry runs.
//!
//! Behaves like a small Kinesis: streams take a few `describe_stream` polls to
//! provision, records are appended to a single shard, and cursors walk the
//! shard in append order until an empty batch signals the end.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::config::MockServiceConfig;
use crate::client::{
    ClientError, Cursor, LogServiceClient, PutRecordOutput, Record, RecordBatch, ShardId,
    StartingPosition, StreamDescription, StreamStatus,
};

const CURSOR_SEPARATOR: char = '|';

/// Call counts observed by the mock service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub creates: u64,
    pub describes: u64,
    pub deletes: u64,
    pub puts: u64,
    pub reads: u64,
}

struct MockStream {
    shard_id: ShardId,
    polls_remaining: u32,
    records: Vec<Record>,
}

/// Thread-safe in-memory log service
pub struct MockLogService {
    config: MockServiceConfig,
    streams: DashMap<String, MockStream>,
    creates: AtomicU64,
    describes: AtomicU64,
    deletes: AtomicU64,
    puts: AtomicU64,
    reads: AtomicU64,
}

impl MockLogService {
    /// Create a new mock service with the given configuration
    pub fn new(config: MockServiceConfig) -> Self {
        Self {
            config,
            streams: DashMap::new(),
            creates: AtomicU64::new(0),
            describes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Snapshot of the call counters
    pub fn stats(&self) -> CallStats {
        CallStats {
            creates: self.creates.load(Ordering::Relaxed),
            describes: self.describes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
        }
    }

    /// Number of records stored in a stream, if it exists
    pub fn record_count(&self, stream: &str) -> Option<usize> {
        self.streams.get(stream).map(|s| s.records.len())
    }

    pub fn stream_exists(&self, stream: &str) -> bool {
        self.streams.contains_key(stream)
    }

    async fn simulate_latency(millis: u64) {
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

impl Default for MockLogService {
    fn default() -> Self {
        Self::new(MockServiceConfig::default())
    }
}

fn encode_cursor(stream: &str, shard_id: &ShardId, offset: usize) -> Cursor {
    Cursor::new(format!(
        "{stream}{CURSOR_SEPARATOR}{shard_id}{CURSOR_SEPARATOR}{offset}"
    ))
}

fn decode_cursor(cursor: &Cursor) -> Result<(&str, &str, usize), ClientError> {
    let invalid = || ClientError::InvalidCursor(cursor.as_str().to_string());

    let mut parts = cursor.as_str().rsplitn(3, CURSOR_SEPARATOR);
    let offset = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(invalid)?;
    let shard = parts.next().ok_or_else(invalid)?;
    let stream = parts.next().ok_or_else(invalid)?;
    Ok((stream, shard, offset))
}

#[async_trait]
impl LogServiceClient for MockLogService {
    async fn create_stream(&self, name: &str, _shard_count: u32) -> Result<(), ClientError> {
        self.creates.fetch_add(1, Ordering::Relaxed);

        match self.streams.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(ClientError::StreamExists(name.to_string()))
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(MockStream {
                    shard_id: ShardId::new("shardId-000000000000"),
                    polls_remaining: self.config.provisioning_polls,
                    records: Vec::new(),
                });
                tracing::debug!("Mock stream {} created", name);
                Ok(())
            }
        }
    }

    async fn describe_stream(&self, name: &str) -> Result<StreamDescription, ClientError> {
        self.describes.fetch_add(1, Ordering::Relaxed);

        let mut stream = self
            .streams
            .get_mut(name)
            .ok_or_else(|| ClientError::StreamNotFound(name.to_string()))?;

        if stream.polls_remaining > 0 {
            stream.polls_remaining -= 1;
            return Ok(StreamDescription {
                status: StreamStatus::Creating,
                shards: Vec::new(),
            });
        }

        Ok(StreamDescription {
            status: StreamStatus::Active,
            shards: vec![stream.shard_id.clone()],
        })
    }

    async fn delete_stream(&self, name: &str) -> Result<(), ClientError> {
        self.deletes.fetch_add(1, Ordering::Relaxed);

        if self.config.fail_delete {
            return Err(ClientError::Service("simulated delete failure".to_string()));
        }

        self.streams
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| ClientError::StreamNotFound(name.to_string()))
    }

    async fn put_record(
        &self,
        stream: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<PutRecordOutput, ClientError> {
        Self::simulate_latency(self.config.put_latency_ms).await;

        let attempt = self.puts.fetch_add(1, Ordering::Relaxed);
        if let Some(limit) = self.config.fail_put_after {
            if attempt >= limit {
                return Err(ClientError::Service("simulated write failure".to_string()));
            }
        }
        if self.config.error_rate > 0.0 && rand::thread_rng().gen::<f64>() < self.config.error_rate
        {
            return Err(ClientError::Service("simulated write failure".to_string()));
        }

        let mut entry = self
            .streams
            .get_mut(stream)
            .ok_or_else(|| ClientError::StreamNotFound(stream.to_string()))?;

        let sequence_number = format!("{:020}", entry.records.len());
        entry.records.push(Record {
            partition_key: partition_key.to_string(),
            data,
            sequence_number: sequence_number.clone(),
        });

        Ok(PutRecordOutput {
            shard_id: entry.shard_id.clone(),
            sequence_number,
        })
    }

    async fn get_shard_iterator(
        &self,
        stream: &str,
        shard_id: &ShardId,
        position: StartingPosition,
    ) -> Result<Cursor, ClientError> {
        let entry = self
            .streams
            .get(stream)
            .ok_or_else(|| ClientError::StreamNotFound(stream.to_string()))?;

        if entry.shard_id != *shard_id {
            return Err(ClientError::Service(format!("unknown shard {shard_id}")));
        }

        let offset = match position {
            StartingPosition::TrimHorizon => 0,
            StartingPosition::Latest => entry.records.len(),
        };
        Ok(encode_cursor(stream, shard_id, offset))
    }

    async fn get_records(
        &self,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<Option<RecordBatch>, ClientError> {
        Self::simulate_latency(self.config.read_latency_ms).await;

        let attempt = self.reads.fetch_add(1, Ordering::Relaxed);
        if let Some(limit) = self.config.fail_read_after {
            if attempt >= limit {
                return Err(ClientError::Service("simulated read failure".to_string()));
            }
        }

        let (stream, shard, offset) = decode_cursor(cursor)?;
        let entry = self
            .streams
            .get(stream)
            .ok_or_else(|| ClientError::StreamNotFound(stream.to_string()))?;

        let batch_limit = limit
            .map(|l| (l as usize).min(self.config.batch_limit))
            .unwrap_or(self.config.batch_limit);
        let start = offset.min(entry.records.len());
        let end = start.saturating_add(batch_limit).min(entry.records.len());
        let records = entry.records[start..end].to_vec();

        Ok(Some(RecordBatch {
            records,
            next_cursor: Some(encode_cursor(stream, &ShardId::new(shard), end)),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_service() -> MockLogService {
        MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            ..Default::default()
        })
    }

    #[test]
    fn test_cursor_roundtrip_with_separator_free_names() {
        let cursor = encode_cursor("bench", &ShardId::new("shardId-1"), 42);
        let (stream, shard, offset) = decode_cursor(&cursor).unwrap();
        assert_eq!(stream, "bench");
        assert_eq!(shard, "shardId-1");
        assert_eq!(offset, 42);
    }

    #[test]
    fn test_decode_invalid_cursor() {
        let err = decode_cursor(&Cursor::new("garbage")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCursor(_)));

        let err = decode_cursor(&Cursor::new("a|b|notanumber")).unwrap_err();
        assert!(matches!(err, ClientError::InvalidCursor(_)));
    }

    #[tokio::test]
    async fn test_create_twice_fails() {
        let service = ready_service();
        service.create_stream("bench", 1).await.unwrap();
        let err = service.create_stream("bench", 1).await.unwrap_err();
        assert!(matches!(err, ClientError::StreamExists(_)));
        assert_eq!(service.stats().creates, 2);
    }

    #[tokio::test]
    async fn test_shards_appear_after_provisioning_polls() {
        let service = MockLogService::new(MockServiceConfig {
            provisioning_polls: 2,
            ..Default::default()
        });
        service.create_stream("bench", 1).await.unwrap();

        for _ in 0..2 {
            let description = service.describe_stream("bench").await.unwrap();
            assert!(description.shards.is_empty());
            assert_eq!(description.status, StreamStatus::Creating);
        }

        let description = service.describe_stream("bench").await.unwrap();
        assert_eq!(description.status, StreamStatus::Active);
        assert_eq!(description.shards.len(), 1);
    }

    #[tokio::test]
    async fn test_batches_end_with_empty_read() {
        let service = MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            batch_limit: 5,
            ..Default::default()
        });
        service.create_stream("bench", 1).await.unwrap();
        for n in 0..10 {
            service
                .put_record("bench", "key", Bytes::from(format!("message {n}")))
                .await
                .unwrap();
        }

        let shard = service.describe_stream("bench").await.unwrap().shards[0].clone();
        let mut cursor = service
            .get_shard_iterator("bench", &shard, StartingPosition::TrimHorizon)
            .await
            .unwrap();

        let mut sizes = Vec::new();
        loop {
            let batch = service.get_records(&cursor, None).await.unwrap().unwrap();
            sizes.push(batch.records.len());
            if batch.records.is_empty() {
                break;
            }
            cursor = batch.next_cursor.unwrap();
        }
        assert_eq!(sizes, vec![5, 5, 0]);
    }

    #[tokio::test]
    async fn test_latest_iterator_skips_existing_records() {
        let service = ready_service();
        service.create_stream("bench", 1).await.unwrap();
        service
            .put_record("bench", "key", Bytes::from_static(b"old"))
            .await
            .unwrap();

        let shard = ShardId::new("shardId-000000000000");
        let cursor = service
            .get_shard_iterator("bench", &shard, StartingPosition::Latest)
            .await
            .unwrap();
        let batch = service.get_records(&cursor, None).await.unwrap().unwrap();
        assert!(batch.records.is_empty());
    }

    #[tokio::test]
    async fn test_fail_put_after() {
        let service = MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            fail_put_after: Some(2),
            ..Default::default()
        });
        service.create_stream("bench", 1).await.unwrap();

        assert!(service.put_record("bench", "k", Bytes::new()).await.is_ok());
        assert!(service.put_record("bench", "k", Bytes::new()).await.is_ok());
        assert!(service.put_record("bench", "k", Bytes::new()).await.is_err());
        assert_eq!(service.record_count("bench"), Some(2));
    }

    #[tokio::test]
    async fn test_unbounded_batch_limit_reads_to_end() {
        let service = MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            batch_limit: usize::MAX,
            ..Default::default()
        });
        service.create_stream("bench", 1).await.unwrap();
        for n in 0..3 {
            service
                .put_record("bench", "key", Bytes::from(format!("message {n}")))
                .await
                .unwrap();
        }

        let shard = ShardId::new("shardId-000000000000");
        let cursor = service
            .get_shard_iterator("bench", &shard, StartingPosition::TrimHorizon)
            .await
            .unwrap();
        let batch = service.get_records(&cursor, None).await.unwrap().unwrap();
        assert_eq!(batch.records.len(), 3);

        let next = batch.next_cursor.unwrap();
        let batch = service.get_records(&next, None).await.unwrap().unwrap();
        assert!(batch.records.is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_stream() {
        let service = ready_service();
        let err = service.delete_stream("missing").await.unwrap_err();
        assert!(matches!(err, ClientError::StreamNotFound(_)));
        assert_eq!(service.stats().deletes, 1);
    }
}
