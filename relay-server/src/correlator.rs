//! Component C — request correlator.
//!
//! Routes a `trigger_ocr` from a mobile peer to the internal worker and
//! back, per §4.C. The correlation key is the requester's sid, round-tripped
//! through the worker — there is no server-side table for the request
//! itself. The one piece of server-side state this module keeps is a map
//! from `requester_sid` to a cancellation handle for its optional timeout
//! timer (§9's note on the ambient OCR-timeout extension); it is strictly
//! timer bookkeeping, not a pending-request queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use socketioxide::SocketIo;
use tokio::sync::oneshot;

use relay_proto::{Envelope, MessageType};

use crate::events::EventEmitter;
use crate::registry::Registry;

#[derive(Debug, Serialize)]
struct PerformOcrRequestPayload<'a> {
    requester_sid: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct OcrResultFrame {
    pub requester_sid: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct OcrErrorFrame {
    pub requester_sid: String,
    pub error: String,
}

#[derive(Clone)]
pub struct Correlator {
    io: SocketIo,
    room: String,
    registry: Arc<Registry>,
    events: EventEmitter,
    ocr_timeout: Option<Duration>,
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<()>>>>,
}

impl Correlator {
    pub fn new(
        io: SocketIo,
        room: impl Into<String>,
        registry: Arc<Registry>,
        events: EventEmitter,
        ocr_timeout: Option<Duration>,
    ) -> Self {
        Correlator {
            io,
            room: room.into(),
            registry,
            events,
            ocr_timeout,
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn send_message_to_room(&self, message_type: MessageType, value: serde_json::Value) {
        let envelope = Envelope::from_backend(message_type, value);
        if let Err(err) = self.io.to(self.room.clone()).emit("message", &envelope) {
            tracing::warn!(%err, "failed to emit message envelope to room");
        }
    }

    /// Handle an inbound `trigger_ocr` from `requester_sid` (§4.C steps 1-3).
    ///
    /// A second `trigger_ocr` from the same sid while one is already in
    /// flight is rejected outright rather than armed: the pending map is
    /// keyed on `requester_sid` alone, so a second `insert` would silently
    /// replace the first request's timer, and the first reply to arrive
    /// would then disarm the *second* request's timer instead of its own,
    /// leaving that second request with no timeout protection at all.
    pub fn trigger_ocr(&self, requester_sid: &str) {
        if self.ocr_timeout.is_some() && self.has_pending(requester_sid) {
            tracing::warn!(requester_sid, "trigger_ocr already in flight for this requester; rejecting concurrent request");
            self.send_message_to_room(
                MessageType::Error,
                json!(format!("OCR request already in progress for {requester_sid}")),
            );
            return;
        }

        self.events.ocr_processing_started(requester_sid);

        let Some(internal_sid) = self.registry.internal_slot() else {
            tracing::warn!(requester_sid, "trigger_ocr with no internal worker registered");
            self.send_message_to_room(
                MessageType::Error,
                json!(format!("No internal worker available to service request from {requester_sid}")),
            );
            self.events.ocr_processing_completed(
                requester_sid,
                false,
                Some("no internal worker".to_string()),
            );
            return;
        };

        if let Err(err) = self.io.to(internal_sid.clone()).emit(
            "perform_ocr_request",
            &PerformOcrRequestPayload { requester_sid },
        ) {
            tracing::warn!(%err, internal_sid, "failed to forward perform_ocr_request");
        }

        self.arm_timeout(requester_sid.to_string());
    }

    fn has_pending(&self, requester_sid: &str) -> bool {
        self.pending.lock().contains_key(requester_sid)
    }

    fn arm_timeout(&self, requester_sid: String) {
        let Some(timeout) = self.ocr_timeout else { return };
        let (tx, mut rx) = oneshot::channel();
        self.pending.lock().insert(requester_sid.clone(), tx);

        let this = self.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(timeout) => {
                    if this.pending.lock().remove(&requester_sid).is_some() {
                        tracing::warn!(requester_sid, "OCR request timed out waiting for internal worker");
                        this.send_message_to_room(
                            MessageType::Error,
                            json!(format!("OCR request from {requester_sid} timed out")),
                        );
                        this.events.ocr_processing_completed(
                            &requester_sid,
                            false,
                            Some("timed out waiting for internal worker".to_string()),
                        );
                    }
                }
                _ = &mut rx => {
                    // Disarmed: the real reply arrived before the deadline.
                }
            }
        });
    }

    /// Cancel the pending timeout for `requester_sid`, if any. Returns
    /// `true` if a timer was actually disarmed (i.e. this reply is not late).
    fn disarm(&self, requester_sid: &str) -> bool {
        match self.pending.lock().remove(requester_sid) {
            Some(tx) => {
                let _ = tx.send(());
                true
            }
            None => false,
        }
    }

    /// Handle the internal worker's `ocr_result` reply (§4.C step 4).
    pub fn on_ocr_result(&self, frame: OcrResultFrame) {
        if self.ocr_timeout.is_some() && !self.disarm(&frame.requester_sid) {
            tracing::warn!(
                requester_sid = frame.requester_sid,
                "dropping ocr_result for a request that already timed out"
            );
            return;
        }

        self.events.ocr_processing_completed(&frame.requester_sid, true, None);
        let preview = relay_proto::event::text_preview(&frame.text, 50);
        self.events.processed_screenshot(true, Some(preview), None);
        self.send_message_to_room(MessageType::OcrResult, json!(frame.text));
    }

    /// Handle the internal worker's `ocr_error` reply (§4.C step 5).
    pub fn on_ocr_error(&self, frame: OcrErrorFrame) {
        if self.ocr_timeout.is_some() && !self.disarm(&frame.requester_sid) {
            tracing::warn!(
                requester_sid = frame.requester_sid,
                "dropping ocr_error for a request that already timed out"
            );
            return;
        }

        self.events.ocr_processing_completed(&frame.requester_sid, false, Some(frame.error.clone()));
        self.events.processed_screenshot(false, None, Some(frame.error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventEmitter;
    use std::time::Duration;

    fn correlator(ocr_timeout: Option<Duration>) -> (Correlator, Arc<Registry>) {
        let (_layer, io) = socketioxide::SocketIo::new_layer();
        let registry = Arc::new(Registry::new());
        let events = EventEmitter::new(io.clone(), "room");
        (Correlator::new(io, "room", registry.clone(), events, ocr_timeout), registry)
    }

    #[tokio::test]
    async fn trigger_ocr_with_no_internal_worker_does_not_panic() {
        let (correlator, _registry) = correlator(None);
        // No internal worker registered: should fall through to the
        // no-worker-available branch and emit a completion failure, not
        // forward a perform_ocr_request anywhere.
        correlator.trigger_ocr("mobile-sid-1");
    }

    #[tokio::test]
    async fn trigger_ocr_with_internal_worker_forwards_request() {
        let (correlator, registry) = correlator(None);
        registry.register_internal("worker-sid");
        correlator.trigger_ocr("mobile-sid-1");
    }

    #[tokio::test]
    async fn on_ocr_result_without_timeout_always_accepted() {
        let (correlator, _registry) = correlator(None);
        correlator.on_ocr_result(OcrResultFrame {
            requester_sid: "mobile-sid-1".to_string(),
            text: "hello world".to_string(),
        });
    }

    #[tokio::test]
    async fn late_reply_after_disarm_is_dropped_not_double_counted() {
        let (correlator, registry) = correlator(Some(Duration::from_secs(30)));
        registry.register_internal("worker-sid");
        correlator.trigger_ocr("mobile-sid-1");

        // First reply disarms the timer and is accepted.
        correlator.on_ocr_result(OcrResultFrame {
            requester_sid: "mobile-sid-1".to_string(),
            text: "first".to_string(),
        });

        // A second, late reply for the same sid finds nothing left to
        // disarm and must be dropped rather than re-processed.
        assert!(!correlator.disarm("mobile-sid-1"));
    }

    #[tokio::test]
    async fn second_trigger_ocr_for_same_sid_is_rejected_while_first_is_in_flight() {
        let (correlator, registry) = correlator(Some(Duration::from_secs(30)));
        registry.register_internal("worker-sid");
        correlator.trigger_ocr("mobile-sid-1");

        // A second request from the same sid must not clobber the first
        // request's timer slot in the pending map.
        correlator.trigger_ocr("mobile-sid-1");

        // The original request's reply must still disarm its own timer.
        assert!(correlator.disarm("mobile-sid-1"));
    }

    #[tokio::test]
    async fn on_ocr_error_with_timeout_but_never_armed_is_dropped() {
        let (correlator, _registry) = correlator(Some(Duration::from_secs(30)));
        // No trigger_ocr was ever called for this sid, so no timer is
        // pending; on_ocr_error must treat this as a late/unknown reply.
        correlator.on_ocr_error(OcrErrorFrame {
            requester_sid: "never-requested".to_string(),
            error: "boom".to_string(),
        });
    }
}
