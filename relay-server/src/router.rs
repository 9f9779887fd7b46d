//! Component B — message router.
//!
//! Wires the Socket.IO namespace's handlers: classification + registration
//! on connect, deregistration + InternalSlot cleanup on disconnect, the
//! generic `message` hot path, and the small set of typed control events
//! (`register_internal_client`, `join_room`, `leave_room`, `ocr_result`,
//! `ocr_error`, `capture_result`, `capture_error`). Every handler logs the
//! inbound frame at debug level before doing anything else — the
//! diagnostic trail the original's wildcard handler gave for free.

use std::sync::Arc;

use axum::http::header::USER_AGENT;
use serde_json::{json, Value};
use socketioxide::extract::{Data, SocketRef};

use relay_proto::{Envelope, MessageType};

use crate::correlator::{Correlator, OcrErrorFrame, OcrResultFrame};
use crate::events::EventEmitter;
use crate::registry::{Classification, Registry};

#[derive(Clone)]
pub struct RouterState {
    pub registry: Arc<Registry>,
    pub events: EventEmitter,
    pub correlator: Correlator,
    pub room: String,
}

fn peer_addr(socket: &SocketRef) -> String {
    socket
        .req_parts()
        .extensions
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn user_agent(socket: &SocketRef) -> Option<String> {
    socket
        .req_parts()
        .headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Register every handler on a freshly-connected socket (§4.B `on_connect`).
pub fn register(socket: SocketRef, auth: Value, state: RouterState) {
    let sid = socket.id.to_string();
    tracing::debug!(sid, event = "connect", "inbound connect");

    let client_type = auth.get("client_type").and_then(Value::as_str);
    let ua = user_agent(&socket);
    let classification = Classification::classify(client_type, ua.as_deref());
    let addr = peer_addr(&socket);

    match state.registry.register(sid.clone(), addr.clone(), classification) {
        Ok(_peer) => {}
        Err(err) => {
            tracing::warn!(sid, %err, "transport reused a sid with a different address");
            return;
        }
    }

    state.events.client_connected(&sid, &addr, classification.as_str());

    if let Err(err) = socket.join(state.room.clone()) {
        tracing::warn!(sid, %err, "failed to auto-join default room");
    }
    state.registry.join(&sid, state.room.clone());
    state.events.client_joined_room(&sid, &state.room);

    let welcome = Envelope::from_backend_for(
        MessageType::Info,
        json!(format!("Welcome, {sid}")),
        sid.clone(),
    );
    if let Err(err) = socket.within(state.room.clone()).emit("message", &welcome) {
        tracing::warn!(sid, %err, "failed to emit welcome message");
    }

    emit_client_count(&state);

    if classification == Classification::Internal {
        register_internal_client(&sid, &state);
    }

    let disconnect_state = state.clone();
    let disconnect_sid = sid.clone();
    socket.on_disconnect(move |reason: socketioxide::socket::DisconnectReason| {
        on_disconnect(disconnect_sid.clone(), reason, disconnect_state.clone());
    });

    {
        let state = state.clone();
        socket.on("message", move |socket: SocketRef, Data::<Value>(raw)| {
            on_message(socket, raw, state.clone());
        });
    }
    {
        let state = state.clone();
        socket.on(
            "register_internal_client",
            move |socket: SocketRef, Data::<Value>(_payload)| {
                let sid = socket.id.to_string();
                tracing::debug!(sid, event = "register_internal_client", "inbound event");
                register_internal_client(&sid, &state);
            },
        );
    }
    {
        let state = state.clone();
        socket.on("join_room", move |socket: SocketRef, Data::<Value>(payload)| {
            on_join_room(socket, payload, state.clone());
        });
    }
    {
        let state = state.clone();
        socket.on("leave_room", move |socket: SocketRef, Data::<Value>(payload)| {
            on_leave_room(socket, payload, state.clone());
        });
    }
    {
        let state = state.clone();
        socket.on("ocr_result", move |socket: SocketRef, Data::<Value>(payload)| {
            tracing::debug!(sid = %socket.id, event = "ocr_result", "inbound event");
            match serde_json::from_value::<OcrResultFrame>(payload) {
                Ok(frame) => state.correlator.on_ocr_result(frame),
                Err(err) => tracing::warn!(%err, "malformed ocr_result frame dropped"),
            }
        });
    }
    {
        let state = state.clone();
        socket.on("ocr_error", move |socket: SocketRef, Data::<Value>(payload)| {
            tracing::debug!(sid = %socket.id, event = "ocr_error", "inbound event");
            match serde_json::from_value::<OcrErrorFrame>(payload) {
                Ok(frame) => state.correlator.on_ocr_error(frame),
                Err(err) => tracing::warn!(%err, "malformed ocr_error frame dropped"),
            }
        });
    }
    {
        let state = state.clone();
        socket.on("capture_result", move |socket: SocketRef, Data::<Value>(payload)| {
            tracing::debug!(sid = %socket.id, event = "capture_result", "inbound event");
            match serde_json::from_value::<CaptureResultFrame>(payload) {
                Ok(frame) => state.events.captured_screenshot(&frame.filepath),
                Err(err) => tracing::warn!(%err, "malformed capture_result frame dropped"),
            }
        });
    }
    {
        let state = state.clone();
        socket.on("capture_error", move |socket: SocketRef, Data::<Value>(payload)| {
            tracing::debug!(sid = %socket.id, event = "capture_error", "inbound event");
            match serde_json::from_value::<CaptureErrorFrame>(payload) {
                Ok(frame) => state.events.failed_screenshot_capture(&frame.error),
                Err(err) => tracing::warn!(%err, "malformed capture_error frame dropped"),
            }
        });
    }
}

#[derive(serde::Deserialize)]
struct CaptureResultFrame {
    filepath: String,
}

#[derive(serde::Deserialize)]
struct CaptureErrorFrame {
    error: String,
}

fn register_internal_client(sid: &str, state: &RouterState) {
    if let Some(previous) = state.registry.register_internal(sid) {
        if previous != sid {
            tracing::warn!(previous, new = sid, "internal worker slot displaced");
        }
    }
    state.registry.join(sid, state.room.clone());
}

fn on_disconnect(sid: String, reason: socketioxide::socket::DisconnectReason, state: RouterState) {
    tracing::debug!(sid, %reason, "inbound disconnect");
    let (_peer, held_slot) = state.registry.deregister(&sid);
    state.events.client_disconnected(&sid);
    if held_slot {
        tracing::warn!(sid, "internal worker disconnected; clearing InternalSlot");
    }
    emit_client_count(&state);
}

fn on_message(socket: SocketRef, raw: Value, state: RouterState) {
    let sid = socket.id.to_string();
    let envelope = match serde_json::from_value::<Envelope>(raw) {
        Ok(env) => env,
        Err(err) => {
            tracing::debug!(sid, %err, "dropping malformed message envelope");
            return;
        }
    };
    tracing::debug!(sid, message_type = %envelope.message_type, "inbound message");

    if envelope.message_type == MessageType::TriggerOcr {
        state.correlator.trigger_ocr(&sid);
        return;
    }

    if let Err(err) = socket.to(state.room.clone()).emit("message", &envelope) {
        tracing::warn!(sid, %err, "failed to rebroadcast message");
    }
}

fn on_join_room(socket: SocketRef, payload: Value, state: RouterState) {
    let sid = socket.id.to_string();
    tracing::debug!(sid, event = "join_room", "inbound event");
    let Some(room) = payload.get("room").and_then(Value::as_str) else {
        send_private_error(&socket, &sid, "join_room requires a room name");
        return;
    };

    if let Err(err) = socket.join(room.to_string()) {
        tracing::warn!(sid, room, %err, "failed to join room");
        return;
    }
    state.registry.join(&sid, room.to_string());
    state.events.client_joined_room(&sid, room);

    let confirm = Envelope::from_backend_for(
        MessageType::Info,
        json!(format!("{sid} joined room {room}")),
        sid.clone(),
    );
    let _ = socket.within(room.to_string()).emit("message", &confirm);
    emit_client_count(&state);
}

fn on_leave_room(socket: SocketRef, payload: Value, state: RouterState) {
    let sid = socket.id.to_string();
    tracing::debug!(sid, event = "leave_room", "inbound event");
    let Some(room) = payload.get("room").and_then(Value::as_str) else {
        send_private_error(&socket, &sid, "leave_room requires a room name");
        return;
    };

    let confirm = Envelope::from_backend_for(
        MessageType::Info,
        json!(format!("{sid} left room {room}")),
        sid.clone(),
    );
    let _ = socket.within(room.to_string()).emit("message", &confirm);

    if let Err(err) = socket.leave(room.to_string()) {
        tracing::warn!(sid, room, %err, "failed to leave room");
    }
    state.registry.leave(&sid, room);
    state.events.client_left_room(&sid, room);
    emit_client_count(&state);
}

fn send_private_error(socket: &SocketRef, sid: &str, message: &str) {
    let envelope = Envelope::from_backend_for(MessageType::Error, json!(message), sid.to_string());
    if let Err(err) = socket.emit("message", &envelope) {
        tracing::warn!(sid, %err, "failed to deliver private error message");
    }
}

fn emit_client_count(state: &RouterState) {
    let count = state
        .registry
        .count_where(|peer| peer.classification != Classification::Internal);
    state.events.updated_client_count(count);
}
