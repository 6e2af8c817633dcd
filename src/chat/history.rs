// On-demand history reload and local reset

use super::conversation::ConversationStore;
use crate::client::AssistantBackend;
use crate::error::{TransportError, ValidationError};
use crate::events::{EventBroadcaster, HistoryLoadedPayload, EVENT_CHAT_RESET, EVENT_HISTORY_LOADED};
use crate::session::SessionContext;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum HistoryOutcome {
    /// Sequence replaced with this many messages
    Loaded(usize),
    Rejected(ValidationError),
    /// Fetch failed; the current sequence is untouched
    Failed(TransportError),
}

pub struct HistoryController {
    conversation: ConversationStore,
    session: SessionContext,
    backend: Arc<dyn AssistantBackend>,
    events: Arc<EventBroadcaster>,
}

impl HistoryController {
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
        }
    }

    /// Replace the visible sequence with the stored history of the active identity
    pub async fn load_history(&self) -> HistoryOutcome {
        let Some(identity) = self.session.identity() else {
            log::debug!("History load refused: no active session");
            return HistoryOutcome::Rejected(ValidationError::NoActiveSession);
        };

        match self.backend.history(&identity).await {
            Ok(messages) => {
                let count = messages.len();
                self.conversation.replace_messages(messages);
                log::info!("Loaded {} history messages for {}", count, identity);
                self.events.broadcast(
                    EVENT_HISTORY_LOADED,
                    HistoryLoadedPayload {
                        identity,
                        message_count: count,
                    },
                );
                HistoryOutcome::Loaded(count)
            }
            Err(e) => {
                log::warn!("History load failed for {}: {}", identity, e);
                HistoryOutcome::Failed(e)
            }
        }
    }

    /// Clear the visible conversation. Remote history is not touched.
    pub fn reset(&self) {
        self.conversation.reset();
        self.events.broadcast(EVENT_CHAT_RESET, serde_json::json!({}));
    }
}
