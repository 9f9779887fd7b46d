//! Component G — periodic broadcaster.
//!
//! Fires every `health_check_interval` seconds and emits a `client_count`
//! message (not an event) to the default room, excluding internal peers
//! from the count (§4.F/4.G), and logs the roster at info level.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use socketioxide::SocketIo;

use relay_proto::{Envelope, MessageType};

use crate::registry::{Classification, Registry};

pub async fn run(io: SocketIo, room: String, registry: Arc<Registry>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;

        let roster: Vec<String> = registry
            .members(&room)
            .into_iter()
            .filter_map(|sid| registry.lookup(&sid).map(|p| format!("{sid}:{}", p.classification.as_str())))
            .collect();
        let count = registry.count_where(|p| p.classification != Classification::Internal);

        tracing::info!(count, roster = ?roster, "client count heartbeat");

        let envelope = Envelope::from_backend(MessageType::ClientCount, json!({ "count": count }));
        if let Err(err) = io.to(room.clone()).emit("message", &envelope) {
            tracing::warn!(%err, "failed to emit client_count heartbeat");
        }
    }
}
