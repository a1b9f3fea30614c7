use anyhow::Result;
use std::sync::Arc;

use kinesis_bench::bench::{BenchmarkReport, BenchmarkRunner, MockLogService};
use kinesis_bench::client::LogServiceClient;
use kinesis_bench::config::{Backend, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (for log level)
    let config = Config::load()?;
    config.validate()?;

    // Initialize logging with a configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    let client = build_client(&config).await?;
    let stream_name = config.benchmark.resolve_stream_name();

    print_startup_banner(&config, &stream_name);

    let runner = BenchmarkRunner::new(config.benchmark.clone(), client);
    let results = match runner
        .run_with_shutdown(&stream_name, shutdown_signal())
        .await
    {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("❌ Benchmark failed: {}", e);
            return Err(e.into());
        }
    };

    let report = BenchmarkReport::from_results(stream_name, &results);
    if config.json_output {
        println!("{}", report.to_json());
    } else {
        report.print_table();
    }

    Ok(())
}

/// Build the log service client for the configured backend
async fn build_client(config: &Config) -> Result<Arc<dyn LogServiceClient>> {
    match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory log service");
            Ok(Arc::new(MockLogService::new(config.mock.clone())))
        }
        #[cfg(feature = "kinesis")]
        Backend::Kinesis => {
            tracing::info!(
                "Using Kinesis in region {}",
                config.region.as_deref().unwrap_or("from AWS config")
            );
            let client = kinesis_bench::client::kinesis::KinesisLogClient::connect(
                config.region.as_deref(),
                config.endpoint_url.as_deref(),
            )
            .await;
            Ok(Arc::new(client))
        }
        #[cfg(not(feature = "kinesis"))]
        Backend::Kinesis => {
            anyhow::bail!("Kinesis backend requested but built without the `kinesis` feature")
        }
    }
}

/// Print startup banner
fn print_startup_banner(config: &Config, stream_name: &str) {
    println!();
    println!("  Kinesis Bench {}", env!("CARGO_PKG_VERSION"));
    println!("  Backend:     {}", config.backend);
    if config.backend == Backend::Kinesis {
        println!(
            "  Region:      {}",
            config.region.as_deref().unwrap_or("(AWS default chain)")
        );
        if let Some(endpoint) = &config.endpoint_url {
            println!("  Endpoint:    {}", endpoint);
        }
    }
    println!("  Stream:      {}", stream_name);
    println!(
        "  Records:     {} ({} requested, {} workers)",
        config.benchmark.total_records().unwrap_or_default(),
        config.benchmark.iterations,
        config.benchmark.publisher_workers
    );
    println!();
}

/// Resolve when the process is asked to stop
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, cleaning up...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, cleaning up...");
        },
    }
}
