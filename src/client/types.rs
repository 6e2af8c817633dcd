// Wire types for the assistant service JSON API

use crate::models::{ChatMessage, Sender};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub email: String,
    pub message: String,
}

/// Reply from `POST /chat`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Service-side model pick; informational only
    #[serde(default)]
    pub current_model: Option<serde_json::Value>,
}

/// One entry of `GET /history/{identity}`.
///
/// User-authored entries carry `email`; assistant entries carry `"username": "Agent"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

impl HistoryEntry {
    pub fn sender(&self) -> Sender {
        if self.email.is_some() {
            Sender::User
        } else {
            Sender::Assistant
        }
    }

    pub fn into_message(self) -> ChatMessage {
        let sender = self.sender();
        let created_at = match self.timestamp {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => Utc::now().to_rfc3339(),
            Some(other) => other.to_string(),
        };

        ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender,
            text: self.message,
            owner_identity: self.email,
            created_at,
        }
    }
}

/// Body of `POST /login`. Credentials are passed through, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body of `POST /signup`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// `{status, message?}` envelope used by login, signup, upload and logout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl StatusResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Body of `POST /logout`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub email: String,
}

/// Reply from `GET /health`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
