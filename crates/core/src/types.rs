//! Request/response types at the orchestrator boundary

use serde::{Deserialize, Serialize};

use crate::language::Language;

/// Where an answer came from, relative to the result cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStatus {
    /// Served from the cache
    Hit,
    /// Freshly generated and stored
    Stored,
    /// Freshly generated but not cacheable (soft failure, degraded or
    /// degenerate result)
    NotStored,
    /// Caching never consulted (e.g. language gate rejection)
    Bypassed,
}

/// Result of `answer()`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    /// User-displayable answer text; always present, even for failures
    pub text: String,
    /// Detected language of the user query, when classified
    pub language: Option<Language>,
    /// Cache disposition of this answer
    pub cache_status: CacheStatus,
}

/// Result of `speak()`
#[derive(Debug, Clone)]
pub struct SpeakResponse {
    /// Synthesized audio bytes
    pub audio: Vec<u8>,
    /// Language the audio was synthesized in
    pub language: Language,
    /// Whether the audio came from the cache
    pub cache_hit: bool,
}

/// Ephemeral per-call record of how a query moved through orchestration.
/// Created at the start of `answer()`, discarded at the end; never
/// persisted. Useful for tracing fields and tests.
#[derive(Debug, Clone, Default)]
pub struct QueryEnvelope {
    /// Text as the user typed or spoke it
    pub raw_text: String,
    /// Language the gate settled on, if any
    pub detected_language: Option<Language>,
    /// Input matched an affirmative pattern
    pub is_affirmative: bool,
    /// Query after affirmative resolution (equals `raw_text` when no
    /// rewrite happened)
    pub resolved_text: String,
    /// Input matched the comprehensive-listing keyword set
    pub is_comprehensive: bool,
}

impl QueryEnvelope {
    pub fn new(raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let resolved_text = raw_text.clone();
        Self {
            raw_text,
            resolved_text,
            ..Default::default()
        }
    }
}

/// Case/whitespace normalization shared by cache keying and matching:
/// lowercase, trim, collapse internal whitespace runs.
pub fn normalize_query(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("  List ALL   Schemes "), "list all schemes");
        assert_eq!(normalize_query("सर्व योजना"), "सर्व योजना");
    }

    #[test]
    fn test_envelope_defaults() {
        let env = QueryEnvelope::new(" Hello  World ");
        assert_eq!(env.raw_text, " Hello  World ");
        assert_eq!(env.resolved_text, env.raw_text);
        assert!(!env.is_affirmative);
        assert!(!env.is_comprehensive);
    }
}
