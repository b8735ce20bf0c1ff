//! Error taxonomy for external collaborators
//!
//! Upstream failures are tagged variants rather than free-form strings so
//! the retry controller can branch exhaustively on the failure kind.

use thiserror::Error;

/// Failure signalled by the retrieval-generation service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Rate limit hit; retryable with backoff
    #[error("rate limited by upstream service")]
    RateLimited,

    /// Request exceeded the upstream payload/token budget
    #[error("request too large for upstream service")]
    PayloadTooLarge,

    /// Anything else; not retried since the cause is unknown
    #[error("upstream error: {0}")]
    Other(String),
}

impl UpstreamError {
    /// Whether backoff-and-retry is worthwhile for this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Failure signalled by the speech services (STT/TTS)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpeechError {
    #[error("language not supported by speech service")]
    UnsupportedLanguage,

    #[error("no speech detected in audio")]
    NoSpeechDetected,

    /// Input too short or degenerate after cleanup to be worth speaking
    #[error("text too short for synthesis")]
    EmptyText,

    #[error("synthesis error: {0}")]
    Synthesis(String),

    #[error("transcription error: {0}")]
    Transcription(String),
}
