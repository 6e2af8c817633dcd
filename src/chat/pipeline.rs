// Message pipeline: send -> optimistic append -> round trip -> reply append -> extraction

use super::conversation::ConversationStore;
use crate::client::AssistantBackend;
use crate::error::{TransportError, ValidationError};
use crate::events::{
    EventBroadcaster, HintChangedPayload, LoadingChangedPayload, MessageAppendedPayload,
    RecommendationExtractedPayload, SendFailedPayload, EVENT_HINT_CHANGED, EVENT_LOADING_CHANGED,
    EVENT_MESSAGE_APPENDED, EVENT_RECOMMENDATION_EXTRACTED, EVENT_SEND_FAILED,
};
use crate::models::{can_transition, transition_state, ChatMessage, ExchangeState};
use crate::parsers::extract_reply;
use crate::session::SessionContext;
use crate::utils::lock_mutex_recover;
use std::sync::{Arc, Mutex};

/// Message sent when the user asks for a different model
pub const ALTERNATIVE_REQUEST: &str = "I don't like this model. Suggest another one.";

/// What happened to a `send`. Informational; callers may ignore it.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Refused locally; nothing was appended and no request was made
    Rejected(ValidationError),
    Replied(String),
    /// The request failed; the optimistic user message stays
    Failed(TransportError),
}

impl SendOutcome {
    pub fn is_replied(&self) -> bool {
        matches!(self, SendOutcome::Replied(_))
    }
}

/// Serializes message exchanges through an `Idle` gate
pub struct ChatPipeline {
    conversation: ConversationStore,
    session: SessionContext,
    backend: Arc<dyn AssistantBackend>,
    events: Arc<EventBroadcaster>,
    state: Mutex<ExchangeState>,
}

impl ChatPipeline {
    pub fn new(
        conversation: ConversationStore,
        session: SessionContext,
        backend: Arc<dyn AssistantBackend>,
        events: Arc<EventBroadcaster>,
    ) -> Self {
        Self {
            conversation,
            session,
            backend,
            events,
            state: Mutex::new(ExchangeState::Idle),
        }
    }

    pub fn state(&self) -> ExchangeState {
        *lock_mutex_recover(&self.state)
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Whether the send control is enabled for `input`
    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_loading() && self.session.is_active()
    }

    /// Send `text` as the current user.
    ///
    /// Blank text, a missing session, or an exchange already in flight are
    /// rejected with no append and no remote call. Otherwise the user message
    /// is appended before the request goes out and stays even if it fails.
    pub async fn send(&self, text: &str, system_originated: bool) -> SendOutcome {
        if text.trim().is_empty() {
            log::debug!("Rejected send: empty message");
            return SendOutcome::Rejected(ValidationError::EmptyMessage);
        }

        // Identity is captured once; the request completes even if the session ends meanwhile
        let Some(identity) = self.session.identity() else {
            log::debug!("Rejected send: no active session");
            return SendOutcome::Rejected(ValidationError::NoActiveSession);
        };

        {
            let mut state = lock_mutex_recover(&self.state);
            // Check-and-set under one lock; this is the only way into Sending
            if !can_transition(*state, ExchangeState::Sending) {
                log::debug!("Rejected send: exchange in flight ({:?})", *state);
                return SendOutcome::Rejected(ValidationError::SendInFlight);
            }
            *state = ExchangeState::Sending;
        }
        self.broadcast_loading(true);
        // Settles back to Idle however this future ends, including when it is dropped
        let _exchange = ExchangeGuard { pipeline: self };

        let message = ChatMessage::user(&identity, text);
        let message_id = message.id.clone();
        self.conversation.append(message.clone());
        self.events
            .broadcast(EVENT_MESSAGE_APPENDED, MessageAppendedPayload { message });
        if system_originated {
            log::debug!("Sending system-originated message for {}", identity);
        }

        self.advance(ExchangeState::AwaitingReply);

        let outcome = match self.backend.chat(&identity, text).await {
            Ok(reply) => {
                self.advance(ExchangeState::Success);
                self.accept_reply(&reply);
                SendOutcome::Replied(reply)
            }
            Err(e) => {
                log::warn!("Chat request failed: {}", e);
                self.advance(ExchangeState::Failed);
                self.events.broadcast(
                    EVENT_SEND_FAILED,
                    SendFailedPayload {
                        message_id,
                        error: e.to_string(),
                    },
                );
                SendOutcome::Failed(e)
            }
        };

        outcome
    }

    /// Ask the assistant for a different model
    pub async fn request_alternative(&self) -> SendOutcome {
        self.send(ALTERNATIVE_REQUEST, true).await
    }

    fn accept_reply(&self, reply: &str) {
        let message = ChatMessage::assistant(reply);
        self.conversation.append(message.clone());
        self.events
            .broadcast(EVENT_MESSAGE_APPENDED, MessageAppendedPayload { message });

        let extraction = extract_reply(reply);

        // A blank capture is a match with nothing to show; keep the previous hint
        if let Some(model_name) = extraction.hint.filter(|name| !name.is_empty()) {
            log::debug!("Extracted model hint: {}", model_name);
            self.conversation.set_hint(&model_name);
            self.events
                .broadcast(EVENT_HINT_CHANGED, HintChangedPayload { model_name });
        }

        if let Some(recommendation) = extraction.recommendation {
            log::debug!(
                "Extracted recommendation: {} ({}%)",
                recommendation.model_name,
                recommendation.accuracy
            );
            self.conversation.set_recommendation(recommendation.clone());
            self.events.broadcast(
                EVENT_RECOMMENDATION_EXTRACTED,
                RecommendationExtractedPayload { recommendation },
            );
        }
    }

    /// Move to `target`, falling back to `Idle` on an invalid transition
    fn advance(&self, target: ExchangeState) {
        let mut state = lock_mutex_recover(&self.state);
        match transition_state(*state, target) {
            Ok(next) => *state = next,
            Err(e) => {
                log::error!("{}", e);
                *state = ExchangeState::Idle;
            }
        }
    }

    fn broadcast_loading(&self, loading: bool) {
        self.events
            .broadcast(EVENT_LOADING_CHANGED, LoadingChangedPayload { loading });
    }
}

/// Holds one exchange open; dropping it returns the pipeline to `Idle`
struct ExchangeGuard<'a> {
    pipeline: &'a ChatPipeline,
}

impl Drop for ExchangeGuard<'_> {
    fn drop(&mut self) {
        let previous = std::mem::replace(
            &mut *lock_mutex_recover(&self.pipeline.state),
            ExchangeState::Idle,
        );
        if !can_transition(previous, ExchangeState::Idle) {
            log::warn!("Exchange abandoned in {:?}; pipeline reset to Idle", previous);
        }
        self.pipeline.broadcast_loading(false);
    }
}
