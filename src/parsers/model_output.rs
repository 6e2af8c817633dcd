// Recommendation record parser - recovers labeled fields from a final recommendation reply

use crate::models::ModelRecommendation;
use regex::Regex;
use std::sync::OnceLock;

/// Lowercase phrase that must appear in a reply before any field is extracted
pub const TRIGGER_PHRASE: &str = "final best model recommended";

/// Text fields of a recommendation record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationField {
    ModelName,
    Price,
    Speed,
    Cloud,
    Region,
    Reason,
}

impl RecommendationField {
    pub fn all() -> &'static [RecommendationField] {
        &[
            RecommendationField::ModelName,
            RecommendationField::Price,
            RecommendationField::Speed,
            RecommendationField::Cloud,
            RecommendationField::Region,
            RecommendationField::Reason,
        ]
    }

    /// Label as a regex fragment
    fn label_pattern(&self) -> &'static str {
        match self {
            RecommendationField::ModelName => "Model Name",
            RecommendationField::Price => "Price",
            RecommendationField::Speed => "Speed",
            RecommendationField::Cloud => "Cloud",
            RecommendationField::Region => "Region",
            RecommendationField::Reason => "Reason(?: for Selection)?",
        }
    }

    fn assign(&self, record: &mut ModelRecommendation, value: String) {
        match self {
            RecommendationField::ModelName => record.model_name = value,
            RecommendationField::Price => record.price = value,
            RecommendationField::Speed => record.speed = value,
            RecommendationField::Cloud => record.cloud = value,
            RecommendationField::Region => record.region = value,
            RecommendationField::Reason => record.reason = value,
        }
    }
}

/// One entry of the field rule table
pub struct FieldRule {
    regex: Regex,
    field: RecommendationField,
}

impl FieldRule {
    pub fn field(&self) -> RecommendationField {
        self.field
    }

    /// Rest of the line after the label and optional separator, trimmed; empty when absent
    pub fn extract(&self, text: &str) -> String {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }
}

static FIELD_RULES: OnceLock<Vec<FieldRule>> = OnceLock::new();
static ACCURACY_REGEX: OnceLock<Regex> = OnceLock::new();

/// The field rule table, compiled once
pub fn field_rules() -> &'static [FieldRule] {
    FIELD_RULES.get_or_init(|| {
        RecommendationField::all()
            .iter()
            .map(|&field| FieldRule {
                regex: Regex::new(&format!(r"(?i){}\s*[:\-]?\s*(.+)", field.label_pattern()))
                    .unwrap(),
                field,
            })
            .collect()
    })
}

fn get_accuracy_regex() -> &'static Regex {
    ACCURACY_REGEX
        .get_or_init(|| Regex::new(r"(?i)Accuracy\s*[:\-]?\s*([0-9]+(?:\.[0-9]+)?)\s*%?").unwrap())
}

/// Whether the reply announces a final recommendation
pub fn has_trigger(text: &str) -> bool {
    text.to_lowercase().contains(TRIGGER_PHRASE)
}

/// Accuracy figure as a percentage, if the reply carries one
pub fn extract_accuracy(text: &str) -> Option<f64> {
    get_accuracy_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Parse a recommendation record out of a reply.
///
/// Returns `None` unless the reply contains [`TRIGGER_PHRASE`] (case-insensitive).
/// Once the trigger is present every field is extracted independently: a missing
/// label yields an empty string and a missing accuracy yields `0.0`.
pub fn parse_model_output(text: &str) -> Option<ModelRecommendation> {
    if !has_trigger(text) {
        return None;
    }

    let mut record = ModelRecommendation::from_raw(text);
    for rule in field_rules() {
        rule.field.assign(&mut record, rule.extract(text));
    }
    record.accuracy = extract_accuracy(text).unwrap_or(0.0);

    Some(record)
}
