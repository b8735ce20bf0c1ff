//! Core traits and types for the scheme assistant
//!
//! This crate provides foundational types used across all other crates:
//! - Language and script definitions for the supported languages
//! - Error taxonomy for upstream and speech collaborators
//! - Traits for pluggable backends (retrieval-generation, STT, TTS,
//!   language classification)
//! - Request/response types exposed at the orchestrator boundary

pub mod error;
pub mod language;
pub mod traits;
pub mod types;

pub use error::{SpeechError, UpstreamError};
pub use language::{Language, Script};
pub use traits::{
    Classification, LanguageClassifier, RetrievalGenerator, SpeechSynthesizer, SpeechToText,
};
pub use types::{AnswerResponse, CacheStatus, QueryEnvelope, SpeakResponse};
