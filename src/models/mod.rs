// Data models shared by the pipeline, the session manager and the shell

pub mod state_machine;

pub use state_machine::{can_transition, transition_state, ExchangeState, StateTransitionError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

// ============================================================================
// Session
// ============================================================================

/// Snapshot of the client's session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub identity: String,
    pub active: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self {
            identity: String::new(),
            active: false,
        }
    }
}

// ============================================================================
// Chat Messages
// ============================================================================

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "assistant" | "agent" => Ok(Sender::Assistant),
            _ => Err(format!(
                "Invalid sender: '{}'. Expected 'user' or 'assistant'",
                s
            )),
        }
    }
}

/// A message in the visible conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub sender: Sender,
    pub text: String,
    /// Identity of the local user for their own messages, `None` for the assistant
    pub owner_identity: Option<String>,
    pub created_at: String,
}

impl ChatMessage {
    pub fn user(identity: &str, text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::User,
            text: text.to_string(),
            owner_identity: Some(identity.to_string()),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn assistant(text: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sender: Sender::Assistant,
            text: text.to_string(),
            owner_identity: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Whether this message belongs to the given local user (right-aligned in the shell)
    pub fn is_owned_by(&self, identity: &str) -> bool {
        self.owner_identity.as_deref() == Some(identity)
    }
}

// ============================================================================
// Extraction Results
// ============================================================================

/// Lightweight model-name hint; last extraction wins
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedHint {
    pub model_name: Option<String>,
}

/// Structured recommendation recovered from a reply containing the trigger phrase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRecommendation {
    pub model_name: String,
    pub price: String,
    pub speed: String,
    pub cloud: String,
    pub region: String,
    pub reason: String,
    /// Percentage in 0-100; 0 when the reply carries no accuracy figure
    pub accuracy: f64,
    /// The full reply, verbatim
    pub raw_message: String,
}

impl ModelRecommendation {
    /// Empty record carrying the raw reply; fields are filled by the parser
    pub fn from_raw(raw_message: &str) -> Self {
        Self {
            raw_message: raw_message.to_string(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Uploads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Selected,
    Uploading,
    Done,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Selected => "selected",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Done => "done",
            UploadStatus::Failed => "failed",
        }
    }
}

/// File chosen for upload and where it is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpload {
    pub file: PathBuf,
    pub status: UploadStatus,
}
