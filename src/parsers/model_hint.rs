// Model-name hint extraction from free-text assistant replies

use regex::Regex;
use std::sync::OnceLock;

/// Cue phrases that introduce a recommended model name, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintCue {
    Recommend,
    ShouldUse,
    BestModelIs,
    Suggest,
}

impl HintCue {
    /// All cues in the order they are tried
    pub fn all() -> &'static [HintCue] {
        &[
            HintCue::Recommend,
            HintCue::ShouldUse,
            HintCue::BestModelIs,
            HintCue::Suggest,
        ]
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            HintCue::Recommend => "i recommend",
            HintCue::ShouldUse => "you should use",
            HintCue::BestModelIs => "best model is",
            HintCue::Suggest => "i suggest",
        }
    }
}

/// One entry of the hint rule table
pub struct HintRule {
    regex: Regex,
    cue: HintCue,
}

impl HintRule {
    pub fn cue(&self) -> HintCue {
        self.cue
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Raw capture of the first occurrence of this rule, untrimmed
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// A matched hint and the cue that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintMatch {
    pub cue: HintCue,
    pub model_name: String,
}

// Word characters, hyphens, dots and spaces; stops at any other punctuation or newline
const NAME_CAPTURE: &str = r"([\w\-. ]+)";

static HINT_RULES: OnceLock<Vec<HintRule>> = OnceLock::new();

/// The rule table, compiled once
pub fn hint_rules() -> &'static [HintRule] {
    HINT_RULES.get_or_init(|| {
        HintCue::all()
            .iter()
            .map(|&cue| HintRule {
                regex: Regex::new(&format!(
                    r"(?i){} {}",
                    regex::escape(cue.phrase()),
                    NAME_CAPTURE
                ))
                .unwrap(),
                cue,
            })
            .collect()
    })
}

/// Find the hint using the first rule (in priority order) that matches anywhere in `text`
pub fn extract_hint(text: &str) -> Option<HintMatch> {
    for rule in hint_rules() {
        if let Some(name) = rule.capture(text) {
            return Some(HintMatch {
                cue: rule.cue,
                model_name: name.trim().to_string(),
            });
        }
    }

    None
}

/// Model name suggested by the reply, if any cue phrase is present
pub fn extract_model_name(text: &str) -> Option<String> {
    extract_hint(text).map(|hint| hint.model_name)
}
