use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The closed set of `messageType` values carried on the generic `message`
/// channel, plus a catch-all so deserialization never fails on an unknown
/// string. Keep this exhaustive in match arms rather than reaching for a
/// wildcard `_` — the `Unknown` variant is the only place a wildcard belongs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Info,
    Warning,
    Error,
    TriggerOcr,
    OcrResult,
    ClientCount,
    PerformOcrRequest,
    OcrError,
    Unknown(String),
}

impl MessageType {
    pub fn as_str(&self) -> &str {
        match self {
            MessageType::Info => "info",
            MessageType::Warning => "warning",
            MessageType::Error => "error",
            MessageType::TriggerOcr => "trigger_ocr",
            MessageType::OcrResult => "ocr_result",
            MessageType::ClientCount => "client_count",
            MessageType::PerformOcrRequest => "perform_ocr_request",
            MessageType::OcrError => "ocr_error",
            MessageType::Unknown(s) => s,
        }
    }
}

impl From<&str> for MessageType {
    fn from(s: &str) -> Self {
        match s {
            "info" => MessageType::Info,
            "warning" => MessageType::Warning,
            "error" => MessageType::Error,
            "trigger_ocr" => MessageType::TriggerOcr,
            "ocr_result" => MessageType::OcrResult,
            "client_count" => MessageType::ClientCount,
            "perform_ocr_request" => MessageType::PerformOcrRequest,
            "ocr_error" => MessageType::OcrError,
            other => MessageType::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(MessageType::from(s.as_str()))
    }
}

/// The envelope shape carried on the generic `message` channel, in both
/// directions. `value` is kept as an untyped [`Value`] because its shape
/// depends on `message_type` (a plain string for most variants, an object
/// for `client_count`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "messageType")]
    pub message_type: MessageType,
    pub value: Value,
    #[serde(default)]
    pub from: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "target_sid")]
    pub target_sid: Option<String>,
}

impl Envelope {
    /// Build a server-originated envelope: `from` is always `localBackend`,
    /// `timestamp` is always stamped with the current time.
    pub fn from_backend(message_type: MessageType, value: Value) -> Self {
        Envelope {
            message_type,
            value,
            from: crate::LOCAL_BACKEND.to_string(),
            timestamp: Some(Utc::now()),
            target_sid: None,
        }
    }

    /// Same as [`Envelope::from_backend`] but annotated with the sid the
    /// message concerns, for logging/filtering context only — delivery is
    /// always by transport room, never by this field (see the data model).
    pub fn from_backend_for(message_type: MessageType, value: Value, target_sid: impl Into<String>) -> Self {
        Envelope {
            target_sid: Some(target_sid.into()),
            ..Envelope::from_backend(message_type, value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_message_type_round_trips() {
        let env: Envelope = serde_json::from_str(
            r#"{"messageType":"some_future_type","value":"x","from":"a"}"#,
        )
        .unwrap();
        assert_eq!(env.message_type, MessageType::Unknown("some_future_type".to_string()));
        let back = serde_json::to_string(&env).unwrap();
        assert!(back.contains("some_future_type"));
    }

    #[test]
    fn known_message_type_parses() {
        let env: Envelope =
            serde_json::from_str(r#"{"messageType":"trigger_ocr","value":"","from":"M"}"#).unwrap();
        assert_eq!(env.message_type, MessageType::TriggerOcr);
    }

    #[test]
    fn malformed_envelope_missing_value_is_rejected() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"messageType":"info","from":"a"}"#);
        assert!(result.is_err());
    }
}
