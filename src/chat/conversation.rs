// Visible conversation state: the message sequence plus the extracted hint and record

use crate::models::{ChatMessage, ExtractedHint, ModelRecommendation};
use crate::utils::lock_mutex_recover;
use std::sync::{Arc, Mutex};

/// Everything the shell renders for the current conversation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    pub messages: Vec<ChatMessage>,
    pub hint: ExtractedHint,
    pub recommendation: Option<ModelRecommendation>,
}

/// Shared, append-only message sequence. A reset swaps in a fresh `Conversation`.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    inner: Arc<Mutex<Conversation>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Conversation {
        lock_mutex_recover(&self.inner).clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        lock_mutex_recover(&self.inner).messages.clone()
    }

    pub fn len(&self) -> usize {
        lock_mutex_recover(&self.inner).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hint(&self) -> ExtractedHint {
        lock_mutex_recover(&self.inner).hint.clone()
    }

    pub fn recommendation(&self) -> Option<ModelRecommendation> {
        lock_mutex_recover(&self.inner).recommendation.clone()
    }

    pub(crate) fn append(&self, message: ChatMessage) {
        lock_mutex_recover(&self.inner).messages.push(message);
    }

    /// Last-wins
    pub(crate) fn set_hint(&self, model_name: &str) {
        lock_mutex_recover(&self.inner).hint = ExtractedHint {
            model_name: Some(model_name.to_string()),
        };
    }

    /// Last-wins
    pub(crate) fn set_recommendation(&self, recommendation: ModelRecommendation) {
        lock_mutex_recover(&self.inner).recommendation = Some(recommendation);
    }

    pub(crate) fn replace_messages(&self, messages: Vec<ChatMessage>) {
        lock_mutex_recover(&self.inner).messages = messages;
    }

    pub(crate) fn reset(&self) {
        *lock_mutex_recover(&self.inner) = Conversation::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order() {
        let store = ConversationStore::new();
        store.append(ChatMessage::user("ada@example.com", "one"));
        store.append(ChatMessage::assistant("two"));

        let texts: Vec<String> = store.messages().into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["one", "two"]);
    }

    #[test]
    fn test_hint_and_recommendation_last_wins() {
        let store = ConversationStore::new();
        store.set_hint("Phi-3");
        store.set_hint("Mistral-7B");
        assert_eq!(store.hint().model_name.as_deref(), Some("Mistral-7B"));

        let mut rec = ModelRecommendation::from_raw("a");
        rec.model_name = "A".to_string();
        store.set_recommendation(rec);
        let mut rec = ModelRecommendation::from_raw("b");
        rec.model_name = "B".to_string();
        store.set_recommendation(rec);
        assert_eq!(store.recommendation().unwrap().model_name, "B");
    }

    #[test]
    fn test_reset_is_shared_across_clones() {
        let store = ConversationStore::new();
        let view = store.clone();
        store.append(ChatMessage::assistant("hi"));
        store.set_hint("Phi-3");

        store.reset();
        assert_eq!(view.snapshot(), Conversation::default());
        assert!(view.is_empty());
    }
}
