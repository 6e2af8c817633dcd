// Event types and payload structures for client state changes
// These are broadcast to whoever renders the conversation (the terminal shell)

use crate::models::{ChatMessage, ModelRecommendation, UploadStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// Event name constants
pub const EVENT_MESSAGE_APPENDED: &str = "chat:message_appended";
pub const EVENT_HINT_CHANGED: &str = "chat:hint_changed";
pub const EVENT_RECOMMENDATION_EXTRACTED: &str = "chat:recommendation_extracted";
pub const EVENT_LOADING_CHANGED: &str = "chat:loading_changed";
pub const EVENT_SEND_FAILED: &str = "chat:send_failed";
pub const EVENT_CHAT_RESET: &str = "chat:reset";
pub const EVENT_HISTORY_LOADED: &str = "chat:history_loaded";

pub const EVENT_SESSION_STARTED: &str = "session:started";
pub const EVENT_SESSION_ENDED: &str = "session:ended";

pub const EVENT_UPLOAD_STATUS_CHANGED: &str = "upload:status_changed";

const CHANNEL_CAPACITY: usize = 256;

/// Payload for message appended events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAppendedPayload {
    pub message: ChatMessage,
}

/// Payload for hint change events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintChangedPayload {
    pub model_name: String,
}

/// Payload for recommendation extracted events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationExtractedPayload {
    pub recommendation: ModelRecommendation,
}

/// Payload for loading indicator changes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingChangedPayload {
    pub loading: bool,
}

/// Payload for failed chat sends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFailedPayload {
    pub message_id: String,
    pub error: String,
}

/// Payload for history loaded events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryLoadedPayload {
    pub identity: String,
    pub message_count: usize,
}

/// Payload for session started events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStartedPayload {
    pub identity: String,
    /// True when the session came from persisted state rather than a fresh login
    pub restored: bool,
}

/// Payload for session ended events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEndedPayload {
    pub identity: String,
    pub reason: String, // "user_initiated" | "client_terminating"
}

/// Payload for upload status events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStatusPayload {
    pub file: String,
    pub status: UploadStatus,
    pub error: Option<String>,
}

// ============================================================================
// Broadcaster
// ============================================================================

/// Event envelope sent to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    pub event: String,
    pub payload: serde_json::Value,
}

impl ClientEvent {
    /// Decode the payload into its typed form
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Option<T> {
        serde_json::from_value(self.payload.clone()).ok()
    }
}

/// Fan-out of client events to any number of subscribers
pub struct EventBroadcaster {
    tx: broadcast::Sender<ClientEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Broadcast an event to all subscribers
    pub fn broadcast(&self, event_type: &str, payload: impl Serialize) {
        let event = ClientEvent {
            event: event_type.to_string(),
            payload: serde_json::to_value(payload).unwrap_or(serde_json::Value::Null),
        };

        // Ignore send errors (no receivers)
        let _ = self.tx.send(event);
    }

    /// Subscribe to events (returns a receiver)
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
