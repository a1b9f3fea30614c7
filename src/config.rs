use anyhow::{Context, Result};
use clap::Parser;

use crate::bench::config::{BenchmarkConfig, MockServiceConfig, MAX_READ_LIMIT, SHARD_COUNT};

/// Kinesis Bench - stream throughput benchmark
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Name of the stream to create for the run
    #[arg(short = 's', long, env = "STREAM_NAME", default_value = "kinesis-test-rs")]
    pub stream_name: String,

    /// Append a random suffix to the stream name
    #[arg(long, env = "UNIQUE_STREAM_NAME")]
    pub unique_stream_name: bool,

    /// Partition key shared by all records
    #[arg(short = 'p', long, env = "PARTITION_KEY", default_value = "only_one_shard")]
    pub partition_key: String,

    /// Records to publish (rounded up to a multiple of workers)
    #[arg(short = 'n', long, env = "ITERATIONS", default_value = "200")]
    pub iterations: u64,

    /// Concurrent publisher workers
    #[arg(short = 'w', long, env = "PUBLISHER_WORKERS", default_value = "3")]
    pub workers: usize,

    /// Log service backend (kinesis, memory)
    #[arg(short = 'b', long, env = "BENCH_BACKEND", default_value = "kinesis")]
    pub backend: String,

    /// AWS region for Kinesis (overrides AWS_REGION and the profile region)
    #[arg(short = 'r', long, env = "KINESIS_REGION")]
    pub region: Option<String>,

    /// Override the Kinesis endpoint (e.g. LocalStack)
    #[arg(long, env = "KINESIS_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Delay between provisioning polls in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value = "1000")]
    pub poll_interval_ms: u64,

    /// Provisioning polls before giving up
    #[arg(long, env = "MAX_POLL_ATTEMPTS", default_value = "120")]
    pub max_poll_attempts: u32,

    /// Records requested per read call
    #[arg(long, env = "READ_LIMIT")]
    pub read_limit: Option<u32>,

    /// Maximum non-empty read batches while draining
    #[arg(long, env = "MAX_READ_BATCHES")]
    pub max_read_batches: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Suppress provisioning progress dots
    #[arg(long)]
    pub no_progress: bool,

    /// Memory backend: latency per write in milliseconds
    #[arg(long, env = "MOCK_PUT_LATENCY_MS", default_value = "0")]
    pub mock_put_latency_ms: u64,

    /// Memory backend: latency per read in milliseconds
    #[arg(long, env = "MOCK_READ_LATENCY_MS", default_value = "0")]
    pub mock_read_latency_ms: u64,

    /// Memory backend: empty polls before the shard appears
    #[arg(long, env = "MOCK_PROVISIONING_POLLS", default_value = "2")]
    pub mock_provisioning_polls: u32,

    /// Memory backend: maximum records per read
    #[arg(long, env = "MOCK_BATCH_LIMIT", default_value = "10000")]
    pub mock_batch_limit: usize,

    /// Memory backend: random write error rate (0.0 to 1.0)
    #[arg(long, env = "MOCK_ERROR_RATE", default_value = "0.0")]
    pub mock_error_rate: f64,
}

/// Log service the benchmark runs against
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Kinesis,
    Memory,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Kinesis => write!(f, "kinesis"),
            Backend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kinesis" => Ok(Backend::Kinesis),
            "memory" | "mock" => Ok(Backend::Memory),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub benchmark: BenchmarkConfig,

    // Backend selection
    pub backend: Backend,
    /// `None` defers to the AWS default region chain
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub mock: MockServiceConfig,

    // Output
    pub log_level: String,
    pub json_output: bool,
}

impl Config {
    /// Load configuration from all sources with priority: CLI > ENV > .env > defaults
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_args(CliArgs::parse())
    }

    /// Build configuration from parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let backend = args
            .backend
            .parse::<Backend>()
            .map_err(anyhow::Error::msg)
            .context("Invalid --backend")?;

        Ok(Config {
            benchmark: BenchmarkConfig {
                stream_name: args.stream_name,
                unique_stream_name: args.unique_stream_name,
                partition_key: args.partition_key,
                shard_count: SHARD_COUNT,
                iterations: args.iterations,
                publisher_workers: args.workers,
                poll_interval_ms: args.poll_interval_ms,
                max_poll_attempts: args.max_poll_attempts,
                read_limit: args.read_limit,
                max_read_batches: args.max_read_batches,
                show_progress: !args.no_progress,
            },
            backend,
            region: args.region.filter(|region| !region.is_empty()),
            endpoint_url: args.endpoint_url.filter(|url| !url.is_empty()),
            mock: MockServiceConfig {
                provisioning_polls: args.mock_provisioning_polls,
                put_latency_ms: args.mock_put_latency_ms,
                read_latency_ms: args.mock_read_latency_ms,
                batch_limit: args.mock_batch_limit,
                error_rate: args.mock_error_rate,
                ..Default::default()
            },
            log_level: args.log_level,
            json_output: args.json,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.benchmark
            .validate()
            .context("Invalid benchmark configuration")?;

        if !(0.0..=1.0).contains(&self.mock.error_rate) {
            anyhow::bail!(
                "MOCK_ERROR_RATE must be between 0.0 and 1.0, got {}",
                self.mock.error_rate
            );
        }
        if self.mock.batch_limit == 0 || self.mock.batch_limit > MAX_READ_LIMIT as usize {
            anyhow::bail!(
                "MOCK_BATCH_LIMIT must be between 1 and {}, got {}",
                MAX_READ_LIMIT,
                self.mock.batch_limit
            );
        }
        if self.backend == Backend::Kinesis && !cfg!(feature = "kinesis") {
            anyhow::bail!("Kinesis backend requested but built without the `kinesis` feature");
        }

        Ok(())
    }
}
