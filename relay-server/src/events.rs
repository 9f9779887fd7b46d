//! Component F — event emitter.
//!
//! The only path by which lifecycle events reach the wire. Each method
//! corresponds to exactly one [`EventName`] variant and takes the payload
//! struct that event declares, so a caller cannot accidentally send a body
//! that doesn't match its event name.

use relay_proto::event::{
    CapturedScreenshotPayload, ClientConnectedPayload, ClientDisconnectedPayload,
    ClientRoomPayload, EventName, FailedScreenshotCapturePayload, OcrProcessingCompletedPayload,
    OcrProcessingStartedPayload, ProcessedScreenshotPayload, ServerStartedPayload,
    UpdatedClientCountPayload,
};
use socketioxide::SocketIo;

#[derive(Clone)]
pub struct EventEmitter {
    io: SocketIo,
    room: String,
}

impl EventEmitter {
    pub fn new(io: SocketIo, room: impl Into<String>) -> Self {
        EventEmitter { io, room: room.into() }
    }

    fn emit(&self, name: EventName, payload: impl serde::Serialize) {
        if let Err(err) = self.io.to(self.room.clone()).emit(name.as_str(), &payload) {
            tracing::warn!(event = name.as_str(), %err, "failed to emit event to room");
        }
    }

    pub fn server_started(&self, host: &str, port: u16) {
        self.emit(
            EventName::ServerStarted,
            ServerStartedPayload { host: host.to_string(), port },
        );
    }

    pub fn client_connected(&self, sid: &str, address: &str, client_type: &str) {
        self.emit(
            EventName::ClientConnected,
            ClientConnectedPayload {
                sid: sid.to_string(),
                address: address.to_string(),
                client_type: client_type.to_string(),
            },
        );
    }

    pub fn client_disconnected(&self, sid: &str) {
        self.emit(
            EventName::ClientDisconnected,
            ClientDisconnectedPayload { sid: sid.to_string() },
        );
    }

    pub fn client_joined_room(&self, sid: &str, room: &str) {
        self.emit(
            EventName::ClientJoinedRoom,
            ClientRoomPayload { sid: sid.to_string(), room: room.to_string() },
        );
    }

    pub fn client_left_room(&self, sid: &str, room: &str) {
        self.emit(
            EventName::ClientLeftRoom,
            ClientRoomPayload { sid: sid.to_string(), room: room.to_string() },
        );
    }

    pub fn updated_client_count(&self, count: usize) {
        self.emit(EventName::UpdatedClientCount, UpdatedClientCountPayload { count });
    }

    pub fn captured_screenshot(&self, filepath: &str) {
        self.emit(
            EventName::CapturedScreenshot,
            CapturedScreenshotPayload { filepath: filepath.to_string() },
        );
    }

    pub fn failed_screenshot_capture(&self, error: &str) {
        self.emit(
            EventName::FailedScreenshotCapture,
            FailedScreenshotCapturePayload { error: error.to_string() },
        );
    }

    pub fn ocr_processing_started(&self, requester_sid: &str) {
        self.emit(
            EventName::OcrProcessingStarted,
            OcrProcessingStartedPayload { requester_sid: requester_sid.to_string() },
        );
    }

    pub fn ocr_processing_completed(&self, requester_sid: &str, success: bool, error: Option<String>) {
        self.emit(
            EventName::OcrProcessingCompleted,
            OcrProcessingCompletedPayload { requester_sid: requester_sid.to_string(), success, error },
        );
    }

    pub fn processed_screenshot(&self, success: bool, text_preview: Option<String>, error: Option<String>) {
        self.emit(
            EventName::ProcessedScreenshot,
            ProcessedScreenshotPayload { success, text_preview, error },
        );
    }
}
