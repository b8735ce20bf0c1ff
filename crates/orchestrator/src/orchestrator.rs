//! Top-level query orchestrator
//!
//! Composes the language gate, conversation context, result caches,
//! retry controller and comprehensive-listing expander into the two
//! operations the HTTP surface calls: `answer` and `speak`. Every
//! `answer` path returns a displayable string; failures surface as
//! fixed messages, never as errors past this boundary.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use sahayak_config::Settings;
use sahayak_core::error::SpeechError;
use sahayak_core::language::Language;
use sahayak_core::traits::{RetrievalGenerator, SpeechSynthesizer};
use sahayak_core::types::{AnswerResponse, CacheStatus, QueryEnvelope, SpeakResponse};

use crate::cache::{audio_cache_key, cache_key, ResultCache};
use crate::context::ContextStore;
use crate::expansion::ComprehensiveQueryExpander;
use crate::gate::LanguageGate;
use crate::messages;
use crate::retry::{RetryController, RetryOutcome};

/// Answers shorter than this (trimmed) are degenerate: treated as a
/// failure for caching and replaced with the fixed no-answer message
const MIN_ANSWER_CHARS: usize = 2;

/// Cleaned text shorter than this is not worth synthesizing
const MIN_TTS_CHARS: usize = 5;

/// Bracketed status markers ("[Cached] ", "[Simplified ...] ") read
/// badly aloud
static TTS_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]\s*").expect("valid marker pattern"));

/// Emoji and markdown decoration stripped before synthesis
static TTS_SYMBOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[✅ℹ️🔍⚠️*●•#=]").expect("valid symbol pattern"));

/// Orchestrator tuning, lifted from the relevant `Settings` sections
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub cache: sahayak_config::CacheConfig,
    pub retry: sahayak_config::RetryConfig,
    pub expansion: sahayak_config::ExpansionConfig,
    pub context: sahayak_config::ContextConfig,
    pub languages: sahayak_config::LanguageConfig,
    /// Overall per-request deadline; 0 disables it
    pub answer_deadline_seconds: u64,
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            cache: settings.cache.clone(),
            retry: settings.retry.clone(),
            expansion: settings.expansion.clone(),
            context: settings.context.clone(),
            languages: settings.languages.clone(),
            answer_deadline_seconds: settings.answer_deadline_seconds,
        }
    }
}

pub struct QueryOrchestrator {
    backend: Arc<dyn RetrievalGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    gate: LanguageGate,
    context: ContextStore,
    retry: RetryController,
    expander: ComprehensiveQueryExpander,
    answer_cache: ResultCache<String>,
    audio_cache: ResultCache<Vec<u8>>,
    deadline: Option<Duration>,
}

/// What the generation step produced, before the caching decision
enum Produced {
    /// Real answer; cached and counted as stored
    Cacheable(String),
    /// Displayable but never cached (soft failure, degraded result,
    /// rejected or degenerate answer)
    Display(String),
}

impl QueryOrchestrator {
    pub fn new(
        config: OrchestratorConfig,
        backend: Arc<dyn RetrievalGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        let deadline = match config.answer_deadline_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            backend,
            synthesizer,
            gate: LanguageGate::with_defaults(&config.languages),
            context: ContextStore::new(&config.context),
            retry: RetryController::new(&config.retry),
            expander: ComprehensiveQueryExpander::new(&config.expansion),
            answer_cache: ResultCache::new(config.cache.answer_capacity),
            audio_cache: ResultCache::new(config.cache.audio_capacity),
            deadline,
        }
    }

    /// Answer a user query. Always returns a displayable response.
    pub async fn answer(&self, session_id: &str, user_text: &str) -> AnswerResponse {
        let mut envelope = QueryEnvelope::new(user_text);

        // Gate the raw input before anything else. A rejection must not
        // touch the context, the cache, or the upstream service.
        let decision = self.gate.check(&envelope.raw_text);
        envelope.detected_language = decision.language;
        if !decision.allowed {
            tracing::info!(
                session = session_id,
                confidence = decision.confidence,
                "query rejected by language gate"
            );
            return AnswerResponse {
                text: messages::UNSUPPORTED_LANGUAGE.to_string(),
                language: None,
                cache_status: CacheStatus::Bypassed,
            };
        }

        // Affirmative follow-up resolution against this session's
        // conversation state.
        let resolution = self.context.resolve(session_id, &envelope.raw_text);
        envelope.is_affirmative = resolution.was_rewritten;
        envelope.resolved_text = resolution.effective_query;
        envelope.is_comprehensive =
            ComprehensiveQueryExpander::is_comprehensive(&envelope.resolved_text);

        // Cache lookup on the resolved query. Context still advances on
        // a hit so a follow-up offer inside a cached answer works.
        let key = cache_key(&envelope.resolved_text);
        if let Some(cached) = self.answer_cache.get(&key) {
            tracing::debug!(session = session_id, "answer cache hit");
            self.context
                .update(session_id, &envelope.raw_text, &cached);
            return AnswerResponse {
                text: format!("{}{}", messages::CACHED_PREFIX, cached),
                language: envelope.detected_language,
                cache_status: CacheStatus::Hit,
            };
        }

        let produced = match self.deadline {
            Some(deadline) => {
                match tokio::time::timeout(deadline, self.generate(&envelope)).await {
                    Ok(produced) => produced,
                    Err(_) => {
                        tracing::warn!(
                            session = session_id,
                            deadline_secs = deadline.as_secs(),
                            "answer deadline exceeded"
                        );
                        Produced::Display(messages::NO_ANSWER.to_string())
                    }
                }
            }
            None => self.generate(&envelope).await,
        };

        let (text, cache_status) = match produced {
            Produced::Cacheable(text) => {
                self.answer_cache.put(&key, text.clone());
                (text, CacheStatus::Stored)
            }
            Produced::Display(text) => (text, CacheStatus::NotStored),
        };

        self.context.update(session_id, &envelope.raw_text, &text);
        tracing::info!(
            session = session_id,
            comprehensive = envelope.is_comprehensive,
            rewritten = envelope.is_affirmative,
            cache_status = ?cache_status,
            "answer produced"
        );
        AnswerResponse {
            text,
            language: envelope.detected_language,
            cache_status,
        }
    }

    /// Uncached generation: comprehensive expansion or a single
    /// retrieval call, both under the retry policy.
    async fn generate(&self, envelope: &QueryEnvelope) -> Produced {
        if envelope.is_comprehensive {
            // Listings are assembled locally from extracted names inside
            // a fixed English frame, so unlike the single-call branch the
            // answer-language gate is not applied here.
            let listing = self
                .expander
                .expand(self.backend.as_ref(), &self.retry)
                .await;
            if listing == messages::NO_SCHEMES_EXTRACTED {
                return Produced::Display(listing);
            }
            return Produced::Cacheable(listing);
        }

        let query = envelope.resolved_text.clone();
        let outcome = self
            .retry
            .run(self.backend.as_ref(), false, || self.backend.invoke(&query))
            .await;
        match outcome {
            RetryOutcome::Answer(text) => {
                if text.trim().chars().count() < MIN_ANSWER_CHARS {
                    tracing::warn!("upstream returned a degenerate answer");
                    return Produced::Display(messages::NO_ANSWER.to_string());
                }
                // Generated text is gated like user input; an answer in
                // an unsupported language is never shown or cached.
                let verdict = self.gate.check(&text);
                if !verdict.allowed {
                    tracing::warn!(
                        confidence = verdict.confidence,
                        "generated answer rejected by language gate"
                    );
                    return Produced::Display(messages::UNSUPPORTED_LANGUAGE.to_string());
                }
                Produced::Cacheable(text)
            }
            RetryOutcome::Degraded(text) | RetryOutcome::Failed(text) => Produced::Display(text),
        }
    }

    /// Synthesize speech for `text`, with caching keyed on the cleaned
    /// text, language and speed.
    pub async fn speak(
        &self,
        text: &str,
        language_preference: Option<Language>,
        speed: f32,
    ) -> Result<SpeakResponse, SpeechError> {
        let cleaned = clean_for_tts(text);
        if cleaned.chars().count() < MIN_TTS_CHARS {
            return Err(SpeechError::EmptyText);
        }

        let language = match language_preference {
            Some(language) => language,
            None => self
                .gate
                .check(&cleaned)
                .language
                .unwrap_or(Language::English),
        };

        let key = audio_cache_key(&cleaned, language, speed);
        if let Some(audio) = self.audio_cache.get(&key) {
            tracing::debug!(language = language.code(), "audio cache hit");
            return Ok(SpeakResponse {
                audio,
                language,
                cache_hit: true,
            });
        }

        let audio = self.synthesizer.synthesize(&cleaned, language, speed).await?;
        self.audio_cache.put(&key, audio.clone());
        tracing::info!(
            language = language.code(),
            bytes = audio.len(),
            speed,
            "audio synthesized"
        );
        Ok(SpeakResponse {
            audio,
            language,
            cache_hit: false,
        })
    }

    /// Administrative reset of both result caches
    pub fn clear_cache(&self) {
        self.answer_cache.clear();
        self.audio_cache.clear();
        tracing::info!("result caches cleared");
    }

    /// Administrative reset of all conversation state
    pub fn clear_context(&self) {
        self.context.clear();
        tracing::info!("conversation context cleared");
    }

    pub fn answer_cache_len(&self) -> usize {
        self.answer_cache.len()
    }

    pub fn audio_cache_len(&self) -> usize {
        self.audio_cache.len()
    }
}

/// Strip status markers, emoji and markdown decoration, then collapse
/// whitespace. Synthesis input should be plain prose.
fn clean_for_tts(text: &str) -> String {
    let without_markers = TTS_MARKER_RE.replace_all(text, "");
    let without_symbols = TTS_SYMBOL_RE.replace_all(&without_markers, "");
    without_symbols
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use sahayak_core::error::UpstreamError;
    use sahayak_core::language::Script;

    /// Backend that records queries and answers from a script; repeats
    /// the last scripted entry once exhausted.
    struct RecordingBackend {
        queries: Mutex<Vec<String>>,
        script: Mutex<Vec<Result<String, UpstreamError>>>,
    }

    impl RecordingBackend {
        fn new(mut script: Vec<Result<String, UpstreamError>>) -> Self {
            script.reverse();
            Self {
                queries: Mutex::new(Vec::new()),
                script: Mutex::new(script),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().clone()
        }
    }

    #[async_trait]
    impl RetrievalGenerator for RecordingBackend {
        async fn invoke(&self, query: &str) -> Result<String, UpstreamError> {
            self.queries.lock().push(query.to_string());
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop().unwrap()
            } else {
                script.first().cloned().unwrap_or(Ok(String::new()))
            }
        }
    }

    struct FakeSynthesizer {
        calls: Mutex<usize>,
    }

    impl FakeSynthesizer {
        fn new() -> Self {
            Self {
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for FakeSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            _language: Language,
            _speed: f32,
        ) -> Result<Vec<u8>, SpeechError> {
            *self.calls.lock() += 1;
            Ok(text.as_bytes().to_vec())
        }
    }

    fn config() -> OrchestratorConfig {
        let mut config = OrchestratorConfig::from(&Settings::default());
        config.retry.base_delay_ms = 0;
        config.expansion.inter_query_delay_ms = 0;
        config
    }

    fn orchestrator(backend: Arc<RecordingBackend>) -> QueryOrchestrator {
        QueryOrchestrator::new(config(), backend, Arc::new(FakeSynthesizer::new()))
    }

    const LONG_ANSWER: &str =
        "Janani Suraksha Yojana provides cash assistance to eligible pregnant women \
         for institutional delivery across all districts.";

    #[tokio::test]
    async fn unsupported_language_bypasses_upstream() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(LONG_ANSWER.into())]));
        let orch = orchestrator(backend.clone());

        let response = orch
            .answer("s1", "Какие государственные программы существуют для фермеров")
            .await;
        assert_eq!(response.text, messages::UNSUPPORTED_LANGUAGE);
        assert_eq!(response.cache_status, CacheStatus::Bypassed);
        assert!(backend.queries().is_empty());
        assert_eq!(orch.answer_cache_len(), 0);
    }

    #[tokio::test]
    async fn answer_is_cached_and_served_with_marker() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(LONG_ANSWER.into())]));
        let orch = orchestrator(backend.clone());

        let first = orch.answer("s1", "What is Janani Suraksha Yojana?").await;
        assert_eq!(first.cache_status, CacheStatus::Stored);
        assert_eq!(first.text, LONG_ANSWER);

        // Different whitespace/case, same normalized key.
        let second = orch
            .answer("s1", "  what is JANANI suraksha yojana?  ")
            .await;
        assert_eq!(second.cache_status, CacheStatus::Hit);
        assert_eq!(
            second.text,
            format!("{}{}", messages::CACHED_PREFIX, LONG_ANSWER)
        );
        assert_eq!(backend.queries().len(), 1);
    }

    #[tokio::test]
    async fn retry_exhaustion_leaves_cache_empty() {
        let backend = Arc::new(RecordingBackend::new(vec![
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
            Err(UpstreamError::RateLimited),
        ]));
        let orch = orchestrator(backend.clone());

        let response = orch.answer("s1", "What are the benefits?").await;
        assert_eq!(response.text, messages::RATE_LIMITED);
        assert_eq!(response.cache_status, CacheStatus::NotStored);
        assert_eq!(backend.queries().len(), 3);
        assert_eq!(orch.answer_cache_len(), 0);
    }

    #[tokio::test]
    async fn degenerate_answer_is_not_cached() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok("  ".into())]));
        let orch = orchestrator(backend.clone());

        let response = orch.answer("s1", "What is the helpline number?").await;
        assert_eq!(response.text, messages::NO_ANSWER);
        assert_eq!(response.cache_status, CacheStatus::NotStored);
        assert_eq!(orch.answer_cache_len(), 0);
    }

    #[tokio::test]
    async fn generated_answer_in_unsupported_language_is_rejected() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(
            "Это государственная жилищная программа для сельских семей".into(),
        )]));
        let orch = orchestrator(backend.clone());

        let response = orch.answer("s1", "What is the housing scheme about?").await;
        assert_eq!(response.text, messages::UNSUPPORTED_LANGUAGE);
        assert_eq!(response.cache_status, CacheStatus::NotStored);
        assert_eq!(orch.answer_cache_len(), 0);
    }

    #[tokio::test]
    async fn affirmative_resolves_against_previous_offer() {
        let offer = "Janani Suraksha Yojana supports institutional deliveries. \
                     Would you like to know the eligibility of Janani Suraksha Yojana?";
        let backend = Arc::new(RecordingBackend::new(vec![
            Ok(offer.into()),
            Ok(LONG_ANSWER.into()),
        ]));
        let orch = orchestrator(backend.clone());

        orch.answer("s1", "Tell me about Janani Suraksha Yojana").await;
        let response = orch.answer("s1", "yes").await;

        assert_ne!(response.text, messages::UNSUPPORTED_LANGUAGE);
        let queries = backend.queries();
        assert_eq!(queries.len(), 2);
        assert!(queries[1].contains("eligibility"));
        assert!(queries[1].contains("Janani Suraksha Yojana"));
    }

    #[tokio::test]
    async fn affirmative_after_context_clear_is_literal() {
        let offer = "Would you like to know the eligibility of Janani Suraksha Yojana?";
        let backend = Arc::new(RecordingBackend::new(vec![
            Ok(offer.into()),
            Ok(LONG_ANSWER.into()),
        ]));
        let orch = orchestrator(backend.clone());

        orch.answer("s1", "Tell me about Janani Suraksha Yojana").await;
        orch.clear_context();
        orch.answer("s1", "yes").await;

        let queries = backend.queries();
        assert_eq!(queries[1], "yes");
    }

    #[tokio::test]
    async fn comprehensive_query_routes_through_expander() {
        let pass = |name: &str| {
            Ok(format!(
                "The documents describe {name} which assists eligible families in the state."
            ))
        };
        let backend = Arc::new(RecordingBackend::new(vec![
            pass("Alpha Awas Scheme"),
            pass("Beta Arogya Scheme"),
            pass("Gamma Shiksha Scheme"),
        ]));
        let orch = orchestrator(backend.clone());

        let response = orch.answer("s1", "list all schemes").await;
        assert!(response.text.starts_with("Found 3 potential schemes:\n\n"));
        assert!(response.text.contains("1. Alpha Awas Scheme\n"));
        assert_eq!(response.cache_status, CacheStatus::Stored);
        assert_eq!(backend.queries().len(), 3);

        // Second ask is served from the cache without new upstream calls.
        let cached = orch.answer("s2", "list all schemes").await;
        assert_eq!(cached.cache_status, CacheStatus::Hit);
        assert_eq!(backend.queries().len(), 3);
    }

    #[tokio::test]
    async fn empty_extraction_result_is_not_cached() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(String::new())]));
        let orch = orchestrator(backend.clone());

        let response = orch.answer("s1", "list all schemes").await;
        assert_eq!(response.text, messages::NO_SCHEMES_EXTRACTED);
        assert_eq!(response.cache_status, CacheStatus::NotStored);
        assert_eq!(orch.answer_cache_len(), 0);
    }

    #[tokio::test]
    async fn answer_deadline_yields_no_answer_message() {
        struct SlowBackend;

        #[async_trait]
        impl RetrievalGenerator for SlowBackend {
            async fn invoke(&self, _query: &str) -> Result<String, UpstreamError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(LONG_ANSWER.into())
            }
        }

        let mut config = config();
        config.answer_deadline_seconds = 1;
        let orch = QueryOrchestrator::new(
            config,
            Arc::new(SlowBackend),
            Arc::new(FakeSynthesizer::new()),
        );

        tokio::time::pause();
        let pending = orch.answer("s1", "What is the housing scheme?");
        let response = pending.await;
        assert_eq!(response.text, messages::NO_ANSWER);
        assert_eq!(response.cache_status, CacheStatus::NotStored);
    }

    #[tokio::test]
    async fn speak_caches_on_cleaned_text_language_and_speed() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(LONG_ANSWER.into())]));
        let synthesizer = Arc::new(FakeSynthesizer::new());
        let orch = QueryOrchestrator::new(config(), backend, synthesizer.clone());

        let first = orch
            .speak("[Cached] Scheme details here", Some(Language::English), 1.0)
            .await
            .unwrap();
        assert!(!first.cache_hit);
        // The marker is stripped before synthesis.
        assert_eq!(first.audio, b"Scheme details here".to_vec());

        let second = orch
            .speak("Scheme details here", Some(Language::English), 1.0)
            .await
            .unwrap();
        assert!(second.cache_hit);
        assert_eq!(*synthesizer.calls.lock(), 1);

        // A different speed is a different cache entry.
        let slow = orch
            .speak("Scheme details here", Some(Language::English), 0.7)
            .await
            .unwrap();
        assert!(!slow.cache_hit);
        assert_eq!(*synthesizer.calls.lock(), 2);
    }

    #[tokio::test]
    async fn speak_rejects_degenerate_text() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(LONG_ANSWER.into())]));
        let orch = orchestrator(backend);

        let result = orch.speak("[Cached] ##", None, 1.0).await;
        assert_eq!(result.unwrap_err(), SpeechError::EmptyText);
    }

    #[tokio::test]
    async fn speak_detects_language_when_no_preference() {
        let backend = Arc::new(RecordingBackend::new(vec![Ok(LONG_ANSWER.into())]));
        let orch = orchestrator(backend);

        let response = orch
            .speak("ही योजना गर्भवती महिलांसाठी आर्थिक मदत देते", None, 1.0)
            .await
            .unwrap();
        assert_eq!(response.language.script(), Script::Devanagari);
    }

    #[tokio::test]
    async fn clear_cache_forgets_stored_answers() {
        let backend = Arc::new(RecordingBackend::new(vec![
            Ok(LONG_ANSWER.into()),
            Ok(LONG_ANSWER.into()),
        ]));
        let orch = orchestrator(backend.clone());

        orch.answer("s1", "What is Janani Suraksha Yojana?").await;
        assert_eq!(orch.answer_cache_len(), 1);
        orch.clear_cache();
        assert_eq!(orch.answer_cache_len(), 0);

        let refetched = orch.answer("s1", "What is Janani Suraksha Yojana?").await;
        assert_eq!(refetched.cache_status, CacheStatus::Stored);
        assert_eq!(backend.queries().len(), 2);
    }

    #[test]
    fn tts_cleanup_strips_markers_and_decoration() {
        assert_eq!(
            clean_for_tts("[Cached] ✅ **Eligibility**:  listed   below"),
            "Eligibility: listed below"
        );
    }
}
