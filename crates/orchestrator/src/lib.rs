//! Query orchestration layer
//!
//! Sits between the HTTP surface and the external retrieval-generation
//! backend. Owns:
//! - Bounded FIFO result caches for answers and synthesized audio
//! - A retry/backoff controller with tagged failure classification
//! - A session-keyed conversational context with affirmative follow-up
//!   resolution
//! - A comprehensive-listing expander with multilingual pattern-based
//!   scheme-name extraction
//! - A language gate applied to both inbound queries and generated
//!   answers
//!
//! The orchestrator's contract is fail-soft: every path returns a
//! user-displayable string, even when that string is an apology.

pub mod cache;
pub mod context;
pub mod expansion;
pub mod extraction;
pub mod gate;
pub mod messages;
pub mod orchestrator;
pub mod retry;

pub use cache::{audio_cache_key, cache_key, CacheValue, ResultCache};
pub use context::{ContextStore, ConversationState, FollowUp, FollowUpTopic, Resolution};
pub use expansion::ComprehensiveQueryExpander;
pub use extraction::{extract_scheme_names, ExtractedEntity};
pub use gate::{GateDecision, LanguageGate, ScriptClassifier};
pub use orchestrator::{OrchestratorConfig, QueryOrchestrator};
pub use retry::{RetryController, RetryOutcome};
