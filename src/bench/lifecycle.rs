//! Stream provisioning and teardown.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::client::{LogServiceClient, ShardId};
use crate::error::{BenchError, Result};

/// Lifecycle state of the stream managed for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamState {
    #[default]
    Absent,
    Provisioning,
    Ready,
    Deleting,
}

/// A provisioned stream whose shard is known.
///
/// Only [`StreamLifecycleManager::provision`] hands these out, so holding one
/// means the stream has reached the Ready state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyStream {
    name: String,
    shard_id: ShardId,
}

impl ReadyStream {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shard_id(&self) -> &ShardId {
        &self.shard_id
    }
}

/// Creates the benchmark stream, waits for its shard and deletes it again
pub struct StreamLifecycleManager {
    client: Arc<dyn LogServiceClient>,
    poll_interval: Duration,
    max_poll_attempts: u32,
    show_progress: bool,
    state: StreamState,
}

impl StreamLifecycleManager {
    pub fn new(
        client: Arc<dyn LogServiceClient>,
        poll_interval: Duration,
        max_poll_attempts: u32,
    ) -> Self {
        Self {
            client,
            poll_interval,
            max_poll_attempts,
            show_progress: false,
            state: StreamState::Absent,
        }
    }

    /// Print a dot to stdout for every poll that finds no shard
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Create the stream and wait until its first shard is reported.
    ///
    /// Creation failures are returned as-is; nothing is retried. Polling stops
    /// with [`BenchError::NotReadyInTime`] after `max_poll_attempts` empty
    /// descriptions.
    pub async fn provision(&mut self, name: &str, shard_count: u32) -> Result<ReadyStream> {
        println!("Creating stream {name:?}");
        self.state = StreamState::Provisioning;

        self.client
            .create_stream(name, shard_count)
            .await
            .map_err(|source| BenchError::CreateStream {
                stream: name.to_string(),
                source,
            })?;

        println!("Retrieving shard id from new stream");
        let shard_id = self.wait_for_shard(name).await?;

        if self.show_progress {
            println!();
        }
        println!("Shard id: {shard_id}");

        self.state = StreamState::Ready;
        Ok(ReadyStream {
            name: name.to_string(),
            shard_id,
        })
    }

    async fn wait_for_shard(&self, name: &str) -> Result<ShardId> {
        for attempt in 1..=self.max_poll_attempts {
            let description = self.client.describe_stream(name).await.map_err(|source| {
                BenchError::DescribeStream {
                    stream: name.to_string(),
                    source,
                }
            })?;

            if let Some(shard_id) = description.shards.into_iter().next() {
                tracing::debug!("Shard {} discovered after {} polls", shard_id, attempt);
                return Ok(shard_id);
            }

            tracing::debug!(
                "Stream {} has no shards yet (status: {:?}, attempt {}/{})",
                name,
                description.status,
                attempt,
                self.max_poll_attempts
            );
            if self.show_progress {
                print!(".");
                let _ = std::io::stdout().flush();
            }

            if attempt < self.max_poll_attempts {
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        if self.show_progress {
            println!();
        }
        Err(BenchError::NotReadyInTime {
            stream: name.to_string(),
            attempts: self.max_poll_attempts,
        })
    }

    /// Delete the stream. Failures are logged and returned to the caller.
    pub async fn teardown(&mut self, name: &str) -> Result<()> {
        tracing::info!("Deleting stream {}", name);
        self.state = StreamState::Deleting;

        match self.client.delete_stream(name).await {
            Ok(()) => {
                self.state = StreamState::Absent;
                Ok(())
            }
            Err(source) => {
                tracing::error!("Failed to delete stream {}: {}", name, source);
                Err(BenchError::Teardown {
                    stream: name.to_string(),
                    source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::config::MockServiceConfig;
    use crate::bench::mock_service::MockLogService;

    fn manager(service: Arc<MockLogService>, attempts: u32) -> StreamLifecycleManager {
        StreamLifecycleManager::new(service, Duration::from_millis(1), attempts)
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_polls_until_shard_appears() {
        let service = Arc::new(MockLogService::new(MockServiceConfig {
            provisioning_polls: 3,
            ..Default::default()
        }));
        let mut lifecycle = manager(service.clone(), 10);
        assert_eq!(lifecycle.state(), StreamState::Absent);

        let stream = lifecycle.provision("bench", 1).await.unwrap();
        assert_eq!(stream.name(), "bench");
        assert_eq!(stream.shard_id().as_str(), "shardId-000000000000");
        assert_eq!(lifecycle.state(), StreamState::Ready);
        assert_eq!(service.stats().describes, 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_provision_gives_up_after_max_attempts() {
        let service = Arc::new(MockLogService::new(MockServiceConfig {
            provisioning_polls: 100,
            ..Default::default()
        }));
        let mut lifecycle = manager(service.clone(), 5);

        let err = lifecycle.provision("bench", 1).await.unwrap_err();
        assert!(matches!(
            err,
            BenchError::NotReadyInTime { attempts: 5, .. }
        ));
        assert_eq!(service.stats().describes, 5);
        assert_eq!(lifecycle.state(), StreamState::Provisioning);
    }

    #[tokio::test]
    async fn test_provision_surfaces_create_failure() {
        let service = Arc::new(MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            ..Default::default()
        }));
        service.create_stream("bench", 1).await.unwrap();

        let mut lifecycle = manager(service.clone(), 5);
        let err = lifecycle.provision("bench", 1).await.unwrap_err();
        assert!(matches!(err, BenchError::CreateStream { .. }));
        assert_eq!(service.stats().describes, 0);
    }

    #[tokio::test]
    async fn test_teardown_transitions_to_absent() {
        let service = Arc::new(MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            ..Default::default()
        }));
        let mut lifecycle = manager(service.clone(), 5);
        lifecycle.provision("bench", 1).await.unwrap();

        lifecycle.teardown("bench").await.unwrap();
        assert_eq!(lifecycle.state(), StreamState::Absent);
        assert!(!service.stream_exists("bench"));
    }

    #[tokio::test]
    async fn test_teardown_failure_is_reported() {
        let service = Arc::new(MockLogService::new(MockServiceConfig {
            provisioning_polls: 0,
            fail_delete: true,
            ..Default::default()
        }));
        let mut lifecycle = manager(service.clone(), 5);
        lifecycle.provision("bench", 1).await.unwrap();

        let err = lifecycle.teardown("bench").await.unwrap_err();
        assert!(matches!(err, BenchError::Teardown { .. }));
        assert_eq!(lifecycle.state(), StreamState::Deleting);
    }
}
