// Clippy allows for reasonable defaults
#![allow(clippy::new_without_default)] // Default not always appropriate for stateful types
#![allow(clippy::derivable_impls)] // Explicit Default impls can be clearer

// Module declarations
pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod file_storage;
mod models;
pub mod parsers;
pub mod session;
pub mod shutdown;
mod utils;

// Re-export models for use by the shell and integration tests
pub use models::*;
pub use utils::display_name;

use chat::{ChatPipeline, ConversationStore, HistoryController, UploadSlot};
use client::AssistantBackend;
use events::EventBroadcaster;
use session::{IdentityStore, SessionManager};
use std::sync::Arc;

/// All client components wired to one backend, one session and one event stream
pub struct AdvisorClient {
    pub events: Arc<EventBroadcaster>,
    pub conversation: ConversationStore,
    pub session: Arc<SessionManager>,
    pub pipeline: Arc<ChatPipeline>,
    pub history: Arc<HistoryController>,
    pub uploads: Arc<UploadSlot>,
}

impl AdvisorClient {
    pub fn new(backend: Arc<dyn AssistantBackend>, store: IdentityStore) -> Self {
        let events = Arc::new(EventBroadcaster::new());
        let conversation = ConversationStore::new();
        let session = Arc::new(SessionManager::new(store, backend.clone(), events.clone()));
        let context = session.context();

        let pipeline = Arc::new(ChatPipeline::new(
            conversation.clone(),
            context.clone(),
            backend.clone(),
            events.clone(),
        ));
        let history = Arc::new(HistoryController::new(
            conversation.clone(),
            context,
            backend.clone(),
            events.clone(),
        ));
        let uploads = Arc::new(UploadSlot::new(backend, events.clone()));

        Self {
            events,
            conversation,
            session,
            pipeline,
            history,
            uploads,
        }
    }
}
