//! The worker's Socket.IO client connection to the relay (grounded in
//! `original_source/socketio_server/client.py`'s `ScreenshotClient`: the
//! worker is a standalone process, not an in-process module of the relay).
//! Re-registers as the internal client on every connect, since a dropped
//! TCP connection does not imply the worker process restarted.

use rust_socketio::asynchronous::{Client, ClientBuilder};
use rust_socketio::Payload;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub struct PerformOcrRequest {
    pub requester_sid: String,
}

/// Connect to the relay at `url`, authenticating as the internal client and
/// forwarding every `perform_ocr_request` frame onto `requests`.
pub async fn connect(url: &str, requests: mpsc::Sender<PerformOcrRequest>) -> Result<Client> {
    let client = ClientBuilder::new(url)
        .namespace("/")
        .auth(json!({ "client_type": "internal" }))
        .on("perform_ocr_request", move |payload: Payload, _client: Client| {
            let requests = requests.clone();
            Box::pin(async move {
                let parsed = match payload {
                    Payload::Text(mut values) if !values.is_empty() => {
                        serde_json::from_value::<PerformOcrRequest>(values.remove(0))
                    }
                    Payload::String(s) => serde_json::from_str::<PerformOcrRequest>(&s),
                    _ => {
                        tracing::debug!("ignoring perform_ocr_request with unexpected payload shape");
                        return;
                    }
                };
                match parsed {
                    Ok(req) => {
                        if requests.send(req).await.is_err() {
                            tracing::warn!("worker loop is gone; dropping perform_ocr_request");
                        }
                    }
                    Err(err) => tracing::warn!(%err, "malformed perform_ocr_request dropped"),
                }
            })
        })
        .on("error", |payload: Payload, _client: Client| {
            Box::pin(async move {
                tracing::warn!(?payload, "socket.io transport error");
            })
        })
        .connect()
        .await
        .map_err(Error::Connect)?;

    client
        .emit("register_internal_client", json!({}))
        .await
        .map_err(Error::Connect)?;
    tracing::info!("registered as internal client");

    Ok(client)
}

pub async fn send_ocr_result(client: &Client, requester_sid: &str, text: &str) -> Result<()> {
    client
        .emit("ocr_result", json!({ "requester_sid": requester_sid, "text": text }))
        .await
        .map_err(Error::Connect)
}

pub async fn send_ocr_error(client: &Client, requester_sid: &str, error: &str) -> Result<()> {
    client
        .emit("ocr_error", json!({ "requester_sid": requester_sid, "error": error }))
        .await
        .map_err(Error::Connect)
}

/// Report a successful periodic capture back to the relay so it can emit
/// `captured_screenshot` to the room.
pub async fn send_capture_result(client: &Client, filepath: &str) -> Result<()> {
    client
        .emit("capture_result", json!({ "filepath": filepath }))
        .await
        .map_err(Error::Connect)
}

/// Report a failed periodic capture back to the relay so it can emit
/// `failed_screenshot_capture` to the room.
pub async fn send_capture_error(client: &Client, error: &str) -> Result<()> {
    client
        .emit("capture_error", json!({ "error": error }))
        .await
        .map_err(Error::Connect)
}
