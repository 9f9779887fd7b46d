use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use capture_worker::config::CliArgs;
use capture_worker::worker::{self, WorkerConfig};
use capture_worker::client;

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let json_logs = args.log_json || std::env::var("RELAY_LOG_JSON").unwrap_or_default() == "1";
    let filter = EnvFilter::from_default_env().add_directive("capture_worker=info".parse()?);
    if json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            wait_for_signal().await;
            shutdown.cancel();
        });
    }

    tracing::info!(server_url = %args.server_url, dir = %args.screenshots_dir.display(), "starting capture-worker");

    let mut backoff = Duration::from_secs(1);
    const MAX_BACKOFF: Duration = Duration::from_secs(30);

    while !shutdown.is_cancelled() {
        let (tx, rx) = mpsc::channel(32);
        match client::connect(&args.server_url, tx).await {
            Ok(socket) => {
                backoff = Duration::from_secs(1);
                let worker_config = WorkerConfig {
                    screenshots_dir: args.screenshots_dir.clone(),
                    sentinel_dir: args.sentinel_dir(),
                    frequency_config_path: args.frequency_config.clone(),
                    initial_frequency_secs: args.frequency,
                    cleanup_age: Duration::from_secs(args.cleanup_age_secs),
                };
                worker::run(worker_config, socket, rx, shutdown.clone()).await;
                if !shutdown.is_cancelled() {
                    tracing::warn!("lost connection to relay-server; reconnecting");
                }
            }
            Err(err) => {
                let jittered = jittered_backoff(backoff);
                tracing::warn!(%err, backoff_secs = jittered.as_secs_f64(), "failed to connect to relay-server; retrying");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(jittered) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }

    tracing::info!("capture-worker shut down gracefully");
    Ok(())
}

/// Full jitter: a random duration in `[0, backoff]`, so many workers
/// restarted at once don't all hammer the relay on the same cadence.
fn jittered_backoff(backoff: Duration) -> Duration {
    use rand::Rng;
    let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
    backoff.mul_f64(factor)
}

async fn wait_for_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
