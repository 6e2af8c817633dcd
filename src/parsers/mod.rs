// Extraction engine: recover model hints and recommendation records from assistant prose
//
// Both modes are pure and independent. A miss is `None`, never an error.

pub mod model_hint;
pub mod model_output;

pub use model_hint::{extract_hint, extract_model_name, hint_rules, HintCue, HintMatch, HintRule};
pub use model_output::{
    extract_accuracy, field_rules, has_trigger, parse_model_output, FieldRule,
    RecommendationField, TRIGGER_PHRASE,
};

use crate::models::ModelRecommendation;

/// Everything extracted from one assistant reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyExtraction {
    pub hint: Option<String>,
    pub recommendation: Option<ModelRecommendation>,
}

impl ReplyExtraction {
    pub fn is_empty(&self) -> bool {
        self.hint.is_none() && self.recommendation.is_none()
    }
}

/// Run both extraction modes over a reply
pub fn extract_reply(text: &str) -> ReplyExtraction {
    ReplyExtraction {
        hint: extract_model_name(text),
        recommendation: parse_model_output(text),
    }
}
