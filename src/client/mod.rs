// Boundary to the remote assistant service
//
// Core components only see `AssistantBackend`; `HttpBackend` is the concrete
// JSON-over-HTTP transport.

pub mod http;
#[cfg(test)]
pub(crate) mod mock;
pub mod types;

pub use http::HttpBackend;
pub use types::{
    ChatRequest, ChatResponse, HealthStatus, HistoryEntry, LoginRequest, LogoutRequest,
    SignupRequest, StatusResponse,
};

use crate::error::TransportError;
use crate::models::ChatMessage;
use async_trait::async_trait;
use std::path::Path;

/// Operations consumed from the assistant service
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Send one message and return the raw reply text
    async fn chat(&self, identity: &str, message: &str) -> Result<String, TransportError>;

    async fn upload(&self, file: &Path) -> Result<(), TransportError>;

    /// Stored conversation for `identity`, oldest first
    async fn history(&self, identity: &str) -> Result<Vec<ChatMessage>, TransportError>;

    /// Start a session; returns the identity the service confirmed
    async fn login(&self, request: &LoginRequest) -> Result<String, TransportError>;

    async fn signup(&self, request: &SignupRequest) -> Result<(), TransportError>;

    /// Session-end notice, awaited
    async fn end_session(&self, identity: &str) -> Result<(), TransportError>;

    /// Session-end notice, fire-and-forget. Returns immediately; the result is
    /// never observed by the caller.
    fn end_session_detached(&self, identity: &str);

    async fn health(&self) -> Result<HealthStatus, TransportError>;
}
