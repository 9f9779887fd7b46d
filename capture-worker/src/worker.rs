//! Component E — capture/OCR worker.
//!
//! Two concurrent duties sharing the capture directory: a periodic loop
//! (capture → cleanup → reload check → interruptible wait, per §4.E's
//! pseudocode) and on-demand OCR servicing driven by `perform_ocr_request`
//! frames arriving from the relay. They are independent — on-demand OCR
//! answers immediately regardless of where the periodic loop is in its
//! cycle — so they run as separate tasks rather than one interleaved loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_socketio::asynchronous::Client;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use relay_proto::clamp_frequency;

use crate::client::{send_capture_error, send_capture_result, send_ocr_error, send_ocr_result, PerformOcrRequest};
use crate::sentinel::Sentinels;
use crate::{capture, directory, ocr};

pub struct WorkerConfig {
    pub screenshots_dir: PathBuf,
    pub sentinel_dir: PathBuf,
    pub frequency_config_path: Option<PathBuf>,
    pub initial_frequency_secs: f64,
    pub cleanup_age: Duration,
}

/// Run until `shutdown` is cancelled. Owns the periodic-capture task and
/// services OCR requests inline.
pub async fn run(
    config: WorkerConfig,
    client: Client,
    mut requests: mpsc::Receiver<PerformOcrRequest>,
    shutdown: CancellationToken,
) {
    std::fs::create_dir_all(&config.screenshots_dir).ok();
    std::fs::create_dir_all(&config.sentinel_dir).ok();

    let periodic_shutdown = shutdown.clone();
    let periodic_dir = config.screenshots_dir.clone();
    let periodic_sentinel_dir = config.sentinel_dir.clone();
    let periodic_freq_path = config.frequency_config_path.clone();
    let initial_frequency = config.initial_frequency_secs;
    let cleanup_age = config.cleanup_age;
    let periodic_client = client.clone();
    let periodic = tokio::spawn(async move {
        periodic_loop(
            periodic_dir,
            periodic_sentinel_dir,
            periodic_freq_path,
            initial_frequency,
            cleanup_age,
            periodic_client,
            periodic_shutdown,
        )
        .await;
    });

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            maybe_req = requests.recv() => {
                match maybe_req {
                    Some(req) => handle_ocr_request(&config.screenshots_dir, &client, req).await,
                    None => break,
                }
            }
        }
    }

    periodic.abort();
}

async fn periodic_loop(
    dir: PathBuf,
    sentinel_dir: PathBuf,
    frequency_config_path: Option<PathBuf>,
    initial_frequency_secs: f64,
    cleanup_age: Duration,
    client: Client,
    shutdown: CancellationToken,
) {
    let sentinels = Sentinels::new(&sentinel_dir);
    let (mut frequency, clamped) = clamp_frequency(initial_frequency_secs);
    if clamped {
        tracing::warn!(requested = initial_frequency_secs, default = frequency, "initial capture frequency out of range; using default");
    }

    let mut paused = false;
    loop {
        if shutdown.is_cancelled() {
            return;
        }

        if sentinels.is_paused() {
            if !paused {
                paused = true;
                tracing::info!("capture paused");
            }
            if wait_interruptible(Duration::from_millis(100), &shutdown).await {
                return;
            }
            continue;
        } else if paused {
            paused = false;
            tracing::info!("capture resumed");
        }

        match capture::capture(&dir) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "captured screenshot");
                if let Err(err) = send_capture_result(&client, &path.to_string_lossy()).await {
                    tracing::warn!(%err, "failed to report capture_result to relay");
                }
            }
            Err(err) => {
                tracing::warn!(%err, "screenshot capture failed");
                if let Err(send_err) = send_capture_error(&client, &err.to_string()).await {
                    tracing::warn!(%send_err, "failed to report capture_error to relay");
                }
            }
        }

        let deleted = directory::cleanup_old_screenshots(&dir, cleanup_age);
        if deleted > 0 {
            tracing::debug!(deleted, "cleaned up stale screenshots");
        }

        if sentinels.reload_requested() {
            if let Some(ref path) = frequency_config_path {
                let (new_frequency, clamped) = relay_proto::config::FrequencyConfig::load_clamped(path);
                if clamped {
                    tracing::warn!(requested_from = %path.display(), "reloaded frequency out of range; using default");
                }
                frequency = new_frequency;
                tracing::info!(frequency, "capture frequency reloaded");
            }
            sentinels.clear_reload();
        }

        if wait_interruptible(Duration::from_secs_f64(frequency), &shutdown).await {
            return;
        }
    }
}

/// Sleep for `duration`, but wake early on shutdown or on the pause sentinel
/// appearing (so a pause takes effect within the current wait, not only at
/// the next cycle boundary). Returns `true` if the wait ended because of
/// shutdown.
async fn wait_interruptible(duration: Duration, shutdown: &CancellationToken) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => true,
        _ = tokio::time::sleep(duration) => false,
    }
}

async fn handle_ocr_request(dir: &Path, client: &Client, req: PerformOcrRequest) {
    let sid = req.requester_sid;

    let Some(latest) = directory::latest_capture(dir) else {
        tracing::info!(requester_sid = sid, "no screenshot available for OCR request");
        let _ = send_ocr_error(client, &sid, "no screenshot").await;
        return;
    };

    match ocr::ocr(&latest) {
        Ok(text) if text.trim().is_empty() => {
            tracing::info!(requester_sid = sid, "OCR produced no text");
            let _ = send_ocr_error(client, &sid, "no text").await;
        }
        Ok(text) => {
            if let Err(err) = send_ocr_result(client, &sid, &text).await {
                tracing::warn!(%err, requester_sid = sid, "failed to send ocr_result");
            }
        }
        Err(err) => {
            tracing::warn!(%err, requester_sid = sid, "OCR processing failed");
            let _ = send_ocr_error(client, &sid, &err.to_string()).await;
        }
    }
}
