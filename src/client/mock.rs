// In-memory backend for component tests

use super::types::{HealthStatus, LoginRequest, SignupRequest};
use super::AssistantBackend;
use crate::error::TransportError;
use crate::models::ChatMessage;
use crate::utils::lock_mutex_recover;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MockCall {
    Chat { identity: String, message: String },
    Upload(PathBuf),
    History(String),
    Login(String),
    Signup(String),
    EndSession(String),
    EndSessionDetached(String),
    Health,
}

impl MockCall {
    pub(crate) fn is_notice(&self) -> bool {
        matches!(
            self,
            MockCall::EndSession(_) | MockCall::EndSessionDetached(_)
        )
    }
}

#[derive(Default)]
struct MockState {
    calls: Vec<MockCall>,
    replies: VecDeque<Result<String, TransportError>>,
    uploads: VecDeque<Result<(), TransportError>>,
    history: Option<Result<Vec<ChatMessage>, TransportError>>,
    login: Option<Result<String, TransportError>>,
    end_session: Option<TransportError>,
}

/// Scripted backend. Unscripted calls succeed with neutral values.
#[derive(Default)]
pub(crate) struct MockBackend {
    state: Mutex<MockState>,
    chat_gate: Option<Arc<Notify>>,
}

impl MockBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Hold every chat call until the returned `Notify` is signalled once per call
    pub(crate) fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.chat_gate = Some(gate.clone());
        (self, gate)
    }

    pub(crate) fn with_reply(self, reply: &str) -> Self {
        lock_mutex_recover(&self.state)
            .replies
            .push_back(Ok(reply.to_string()));
        self
    }

    pub(crate) fn with_chat_error(self, error: TransportError) -> Self {
        lock_mutex_recover(&self.state).replies.push_back(Err(error));
        self
    }

    pub(crate) fn with_upload_result(self, result: Result<(), TransportError>) -> Self {
        lock_mutex_recover(&self.state).uploads.push_back(result);
        self
    }

    pub(crate) fn with_history(self, result: Result<Vec<ChatMessage>, TransportError>) -> Self {
        lock_mutex_recover(&self.state).history = Some(result);
        self
    }

    pub(crate) fn with_login(self, result: Result<String, TransportError>) -> Self {
        lock_mutex_recover(&self.state).login = Some(result);
        self
    }

    pub(crate) fn with_end_session_error(self, error: TransportError) -> Self {
        lock_mutex_recover(&self.state).end_session = Some(error);
        self
    }

    pub(crate) fn calls(&self) -> Vec<MockCall> {
        lock_mutex_recover(&self.state).calls.clone()
    }

    pub(crate) fn chat_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockCall::Chat { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn notice_count(&self) -> usize {
        self.calls().iter().filter(|c| c.is_notice()).count()
    }

    /// Yield until at least `n` calls were recorded
    pub(crate) async fn wait_for_calls(&self, n: usize) {
        while lock_mutex_recover(&self.state).calls.len() < n {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: MockCall) {
        lock_mutex_recover(&self.state).calls.push(call);
    }
}

#[async_trait]
impl AssistantBackend for MockBackend {
    async fn chat(&self, identity: &str, message: &str) -> Result<String, TransportError> {
        self.record(MockCall::Chat {
            identity: identity.to_string(),
            message: message.to_string(),
        });
        if let Some(gate) = &self.chat_gate {
            gate.notified().await;
        }
        lock_mutex_recover(&self.state)
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    async fn upload(&self, file: &Path) -> Result<(), TransportError> {
        self.record(MockCall::Upload(file.to_path_buf()));
        lock_mutex_recover(&self.state)
            .uploads
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn history(&self, identity: &str) -> Result<Vec<ChatMessage>, TransportError> {
        self.record(MockCall::History(identity.to_string()));
        lock_mutex_recover(&self.state)
            .history
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn login(&self, request: &LoginRequest) -> Result<String, TransportError> {
        self.record(MockCall::Login(request.email.clone()));
        lock_mutex_recover(&self.state)
            .login
            .clone()
            .unwrap_or_else(|| Ok(request.email.clone()))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), TransportError> {
        self.record(MockCall::Signup(request.email.clone()));
        Ok(())
    }

    async fn end_session(&self, identity: &str) -> Result<(), TransportError> {
        self.record(MockCall::EndSession(identity.to_string()));
        match lock_mutex_recover(&self.state).end_session.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn end_session_detached(&self, identity: &str) {
        // Recorded only; the notice never completes
        self.record(MockCall::EndSessionDetached(identity.to_string()));
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        self.record(MockCall::Health);
        Ok(HealthStatus {
            status: "healthy".to_string(),
            ..Default::default()
        })
    }
}
