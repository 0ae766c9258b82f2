//! Highlight batch worker binary.

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hlt_engine::EngineConfig;
use hlt_worker::{load_manifest, BatchOutcome, BatchRunner, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hlt=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting hlt-worker");

    let config = WorkerConfig::from_env();
    let engine_config = EngineConfig::from_env();
    info!("Worker config: {:?}", config);
    info!("Engine config: {:?}", engine_config);

    let candidates = match load_manifest(&config.manifest_path).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to read manifest {}: {}", config.manifest_path.display(), e);
            std::process::exit(1);
        }
    };

    let runner = match BatchRunner::from_config(config, engine_config).await {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create batch runner: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = tokio::select! {
        result = runner.run(&candidates) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, progress is kept at the last completed stage");
            std::process::exit(130);
        }
    };

    match outcome {
        Ok(BatchOutcome::NothingPending) => info!("No videos to process at this time"),
        Ok(BatchOutcome::Empty { batch_id, ids }) => {
            info!(batch_id = %batch_id, broadcasts = ids.len(), "Batch had no clips to combine")
        }
        Ok(BatchOutcome::Published { batch_id, video, .. }) => {
            info!(batch_id = %batch_id, video = %video.display(), "Batch published")
        }
        Err(e) => {
            error!(retryable = e.is_retryable(), "Batch failed: {}", e);
            std::process::exit(1);
        }
    }

    info!("Worker shutdown complete");
}
