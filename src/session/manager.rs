// Session lifecycle: Anonymous -> Active -> Anonymous

use super::context::{Activation, SessionContext};
use super::store::IdentityStore;
use crate::client::{AssistantBackend, LoginRequest, SignupRequest};
use crate::error::{SessionError, ValidationError};
use crate::events::{
    EventBroadcaster, SessionEndedPayload, SessionStartedPayload, EVENT_SESSION_ENDED,
    EVENT_SESSION_STARTED,
};
use crate::models::Session;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Why a session is ending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Explicit logout; the notice is awaited
    UserInitiated,
    /// The client is going away; the notice is fire-and-forget
    ClientTerminating,
}

impl EndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndReason::UserInitiated => "user_initiated",
            EndReason::ClientTerminating => "client_terminating",
        }
    }
}

impl std::fmt::Display for EndReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Owns the session identity, its persistence, and the session-end notice
pub struct SessionManager {
    context: SessionContext,
    store: IdentityStore,
    backend: Arc<dyn AssistantBackend>,
    events: Arc<EventBroadcaster>,
}

impl SessionManager {
    pub fn new(
        store: IdentityStore,
        backend: Arc<dyn AssistantBackend>,
        events: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            context: SessionContext::new(),
            store,
            backend,
            events,
        }
    }

    /// Shared handle for components that need the current identity
    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    pub fn current(&self) -> Session {
        self.context.snapshot()
    }

    /// Reactivate a persisted session without any network call.
    ///
    /// An unreadable session file is discarded and treated as anonymous.
    pub fn restore(&self) -> Option<String> {
        if let Some(identity) = self.context.identity() {
            return Some(identity);
        }

        let identity = match self.store.load() {
            Ok(Some(identity)) => identity,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Discarding unreadable session file: {}", e);
                if let Err(e) = self.store.clear() {
                    log::warn!("Failed to remove session file: {}", e);
                }
                return None;
            }
        };

        match self.context.activate_with(&identity, || Ok::<(), String>(())) {
            Ok(Activation::Activated) => {
                log::info!("Restored session for {}", identity);
                self.events.broadcast(
                    EVENT_SESSION_STARTED,
                    SessionStartedPayload {
                        identity: identity.clone(),
                        restored: true,
                    },
                );
                Some(identity)
            }
            _ => self.context.identity(),
        }
    }

    /// Persist `identity` and make it the active session.
    ///
    /// Starting the already-active identity again is a no-op; a different
    /// identity is refused until the current session ends.
    pub fn start(&self, identity: &str) -> Result<(), SessionError> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        match self
            .context
            .activate_with(identity, || self.store.save(identity))?
        {
            Activation::Activated => {
                log::info!("Session started for {}", identity);
                self.events.broadcast(
                    EVENT_SESSION_STARTED,
                    SessionStartedPayload {
                        identity: identity.to_string(),
                        restored: false,
                    },
                );
                Ok(())
            }
            Activation::Unchanged => Ok(()),
            Activation::Conflict(existing) => Err(SessionError::AlreadyActive(existing)),
        }
    }

    /// End the active session.
    ///
    /// Local state and the persisted identity are cleared first and
    /// unconditionally; then exactly one session-end notice goes out. Returns
    /// `false` (and sends nothing) when no session was active.
    pub async fn end(&self, reason: EndReason) -> bool {
        let Some(identity) = self.close_local(reason) else {
            return false;
        };

        match reason {
            EndReason::UserInitiated => {
                if let Err(e) = self.backend.end_session(&identity).await {
                    log::warn!("Session-end notice for {} failed: {}", identity, e);
                }
            }
            EndReason::ClientTerminating => self.backend.end_session_detached(&identity),
        }
        true
    }

    /// Synchronous `ClientTerminating` end for signal handlers and exit paths
    pub fn terminate(&self) -> bool {
        match self.close_local(EndReason::ClientTerminating) {
            Some(identity) => {
                self.backend.end_session_detached(&identity);
                true
            }
            None => false,
        }
    }

    /// Clear local session state; only the caller that receives `Some` may notify
    fn close_local(&self, reason: EndReason) -> Option<String> {
        let Some(identity) = self.context.take() else {
            log::debug!("end({}) ignored: no active session", reason);
            return None;
        };

        if let Err(e) = self.store.clear() {
            log::warn!("Failed to clear persisted session: {}", e);
        }

        log::info!("Session ended for {} ({})", identity, reason);
        self.events.broadcast(
            EVENT_SESSION_ENDED,
            SessionEndedPayload {
                identity: identity.clone(),
                reason: reason.as_str().to_string(),
            },
        );
        Some(identity)
    }

    /// Authenticate with the service and start a session for the confirmed identity
    pub async fn login(&self, email: &str, password: &str) -> Result<String, SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        let identity = self.backend.login(&request).await?;
        self.start(&identity)?;
        Ok(identity)
    }

    /// Register an account. Does not start a session.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> Result<(), SessionError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(ValidationError::MissingCredentials.into());
        }

        let request = SignupRequest {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        self.backend.signup(&request).await?;
        log::info!("Registered account for {}", request.email);
        Ok(())
    }
}
