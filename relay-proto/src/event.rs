use serde::Serialize;

/// The closed set of lifecycle event names emitted server → room. Unlike
/// [`crate::MessageType`] this has no catch-all: the server is the only
/// emitter, so there is nothing "unknown" to tolerate on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    ServerStarted,
    ClientConnected,
    ClientDisconnected,
    ClientJoinedRoom,
    ClientLeftRoom,
    UpdatedClientCount,
    CapturedScreenshot,
    FailedScreenshotCapture,
    OcrProcessingStarted,
    OcrProcessingCompleted,
    ProcessedScreenshot,
}

impl EventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventName::ServerStarted => "server_started",
            EventName::ClientConnected => "client_connected",
            EventName::ClientDisconnected => "client_disconnected",
            EventName::ClientJoinedRoom => "client_joined_room",
            EventName::ClientLeftRoom => "client_left_room",
            EventName::UpdatedClientCount => "updated_client_count",
            EventName::CapturedScreenshot => "captured_screenshot",
            EventName::FailedScreenshotCapture => "failed_screenshot_capture",
            EventName::OcrProcessingStarted => "ocr_processing_started",
            EventName::OcrProcessingCompleted => "ocr_processing_completed",
            EventName::ProcessedScreenshot => "processed_screenshot",
        }
    }
}

impl std::fmt::Display for EventName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerStartedPayload {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientConnectedPayload {
    pub sid: String,
    pub address: String,
    pub client_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientDisconnectedPayload {
    pub sid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientRoomPayload {
    pub sid: String,
    pub room: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdatedClientCountPayload {
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapturedScreenshotPayload {
    pub filepath: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedScreenshotCapturePayload {
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OcrProcessingStartedPayload {
    pub requester_sid: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OcrProcessingCompletedPayload {
    pub requester_sid: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedScreenshotPayload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Truncate `text` to `max_chars` characters, appending `...` if it was longer.
/// Used for `ProcessedScreenshotPayload::text_preview` (spec: 50 chars).
pub fn text_preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_with_ellipsis() {
        let long = "a".repeat(60);
        let preview = text_preview(&long, 50);
        assert_eq!(preview.len(), 53);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_leaves_short_text_untouched() {
        assert_eq!(text_preview("hello\nworld", 50), "hello\nworld");
    }
}
