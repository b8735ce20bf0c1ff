//! Traits for pluggable external collaborators
//!
//! The retrieval/embedding mechanism, the language model call, and the
//! speech engines are opaque services behind these traits. The
//! orchestrator only ever sees "query in, answer out" and "text in,
//! audio out".

use async_trait::async_trait;

use crate::error::{SpeechError, UpstreamError};
use crate::language::Language;

/// Combined retrieval + generation service: given a query, return an
/// answer grounded in the uploaded documents.
#[async_trait]
pub trait RetrievalGenerator: Send + Sync {
    async fn invoke(&self, query: &str) -> Result<String, UpstreamError>;
}

/// Speech-to-text service
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError>;
}

/// Speech-synthesis service
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` in `language` at the given speed multiplier
    /// (1.0 = normal).
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        speed: f32,
    ) -> Result<Vec<u8>, SpeechError>;
}

/// Language classification result
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// ISO 639-1 code of the detected language ("en", "hi", "ru", ...).
    /// Not limited to the supported set; the gate decides what to do
    /// with out-of-scope codes.
    pub code: String,
    /// Confidence in [0.0, 1.0]
    pub confidence: f32,
}

impl Classification {
    pub fn new(code: impl Into<String>, confidence: f32) -> Self {
        Self {
            code: code.into(),
            confidence,
        }
    }

    /// Map to a supported language, if the code names one
    pub fn language(&self) -> Option<Language> {
        Language::from_str_loose(&self.code)
    }
}

/// Free-text language classifier
///
/// Implementations may be statistical or heuristic; the gate applies its
/// own script-range fallback when confidence is low.
pub trait LanguageClassifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}
