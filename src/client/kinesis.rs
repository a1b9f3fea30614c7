//! AWS Kinesis implementation of [`LogServiceClient`].

use async_trait::async_trait;
use aws_sdk_kinesis::config::Region;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::{ShardIteratorType, StreamStatus as KinesisStreamStatus};
use bytes::Bytes;

use super::{
    ClientError, Cursor, LogServiceClient, PutRecordOutput, Record, RecordBatch, ShardId,
    StartingPosition, StreamDescription, StreamStatus,
};

/// Kinesis client shared by all benchmark phases
#[derive(Debug, Clone)]
pub struct KinesisLogClient {
    client: aws_sdk_kinesis::Client,
}

impl KinesisLogClient {
    /// Build a client from the default AWS configuration chain.
    ///
    /// `endpoint_url` points the client at a Kinesis-compatible endpoint
    /// such as LocalStack.
    pub async fn connect(region: Option<&str>, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(endpoint_url) = endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }
        let sdk_config = loader.load().await;

        tracing::debug!(
            "Kinesis client configured (region: {:?}, endpoint: {:?})",
            sdk_config.region(),
            endpoint_url
        );

        Self {
            client: aws_sdk_kinesis::Client::new(&sdk_config),
        }
    }

    pub fn from_client(client: aws_sdk_kinesis::Client) -> Self {
        Self { client }
    }
}

fn service_error(err: impl std::error::Error) -> ClientError {
    ClientError::Service(DisplayErrorContext(err).to_string())
}

fn map_status(status: Option<&KinesisStreamStatus>) -> StreamStatus {
    match status {
        Some(KinesisStreamStatus::Active) => StreamStatus::Active,
        Some(KinesisStreamStatus::Deleting) => StreamStatus::Deleting,
        Some(KinesisStreamStatus::Updating) => StreamStatus::Updating,
        _ => StreamStatus::Creating,
    }
}

// Several accessors below are converted with `.into()` into an `Option`:
// their optionality differs between SDK releases.

#[async_trait]
impl LogServiceClient for KinesisLogClient {
    async fn create_stream(&self, name: &str, shard_count: u32) -> Result<(), ClientError> {
        self.client
            .create_stream()
            .stream_name(name)
            .shard_count(shard_count as i32)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_resource_in_use_exception() {
                    ClientError::StreamExists(name.to_string())
                } else {
                    service_error(err)
                }
            })?;
        Ok(())
    }

    async fn describe_stream(&self, name: &str) -> Result<StreamDescription, ClientError> {
        let output = self
            .client
            .describe_stream()
            .stream_name(name)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_resource_not_found_exception() {
                    ClientError::StreamNotFound(name.to_string())
                } else {
                    service_error(err)
                }
            })?;

        let description: Option<&aws_sdk_kinesis::types::StreamDescription> =
            output.stream_description().into();
        let Some(description) = description else {
            return Ok(StreamDescription {
                status: StreamStatus::Creating,
                shards: Vec::new(),
            });
        };

        let shards = description
            .shards()
            .iter()
            .filter_map(|shard| {
                let id: Option<&str> = shard.shard_id().into();
                id.map(ShardId::new)
            })
            .collect();

        Ok(StreamDescription {
            status: map_status(description.stream_status().into()),
            shards,
        })
    }

    async fn delete_stream(&self, name: &str) -> Result<(), ClientError> {
        self.client
            .delete_stream()
            .stream_name(name)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_resource_not_found_exception() {
                    ClientError::StreamNotFound(name.to_string())
                } else {
                    service_error(err)
                }
            })?;
        Ok(())
    }

    async fn put_record(
        &self,
        stream: &str,
        partition_key: &str,
        data: Bytes,
    ) -> Result<PutRecordOutput, ClientError> {
        let output = self
            .client
            .put_record()
            .stream_name(stream)
            .partition_key(partition_key)
            .data(Blob::new(data.to_vec()))
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_provisioned_throughput_exceeded_exception() {
                    ClientError::Throttled
                } else if err.is_resource_not_found_exception() {
                    ClientError::StreamNotFound(stream.to_string())
                } else {
                    service_error(err)
                }
            })?;

        let shard_id: Option<&str> = output.shard_id().into();
        let sequence_number: Option<&str> = output.sequence_number().into();

        Ok(PutRecordOutput {
            shard_id: ShardId::new(shard_id.unwrap_or_default()),
            sequence_number: sequence_number.unwrap_or_default().to_string(),
        })
    }

    async fn get_shard_iterator(
        &self,
        stream: &str,
        shard_id: &ShardId,
        position: StartingPosition,
    ) -> Result<Cursor, ClientError> {
        let iterator_type = match position {
            StartingPosition::TrimHorizon => ShardIteratorType::TrimHorizon,
            StartingPosition::Latest => ShardIteratorType::Latest,
        };

        let output = self
            .client
            .get_shard_iterator()
            .stream_name(stream)
            .shard_id(shard_id.as_str())
            .shard_iterator_type(iterator_type)
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_resource_not_found_exception() {
                    ClientError::StreamNotFound(stream.to_string())
                } else {
                    service_error(err)
                }
            })?;

        output
            .shard_iterator()
            .map(Cursor::new)
            .ok_or_else(|| ClientError::Service("no shard iterator returned".to_string()))
    }

    async fn get_records(
        &self,
        cursor: &Cursor,
        limit: Option<u32>,
    ) -> Result<Option<RecordBatch>, ClientError> {
        let output = self
            .client
            .get_records()
            .shard_iterator(cursor.as_str())
            .set_limit(limit.map(|l| l as i32))
            .send()
            .await
            .map_err(|err| {
                let err = err.into_service_error();
                if err.is_expired_iterator_exception() {
                    ClientError::ExpiredCursor
                } else if err.is_provisioned_throughput_exceeded_exception() {
                    ClientError::Throttled
                } else {
                    service_error(err)
                }
            })?;

        let records = output
            .records()
            .iter()
            .map(|record| {
                let partition_key: Option<&str> = record.partition_key().into();
                let sequence_number: Option<&str> = record.sequence_number().into();
                let data: Option<&Blob> = record.data().into();
                Record {
                    partition_key: partition_key.unwrap_or_default().to_string(),
                    data: data
                        .map(|blob| Bytes::copy_from_slice(blob.as_ref()))
                        .unwrap_or_default(),
                    sequence_number: sequence_number.unwrap_or_default().to_string(),
                }
            })
            .collect();

        Ok(Some(RecordBatch {
            records,
            next_cursor: output.next_shard_iterator().map(Cursor::new),
        }))
    }
}
