//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use sahayak_core::Language;

use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language gate configuration
    #[serde(default)]
    pub languages: LanguageConfig,

    /// Result/audio cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Retry/backoff policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Comprehensive-query expansion
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Conversation context store
    #[serde(default)]
    pub context: ContextConfig,

    /// Retrieval-generation service endpoint
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Speech services (STT/TTS)
    #[serde(default)]
    pub speech: SpeechConfig,

    /// Logging configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Overall per-request deadline in seconds; 0 disables the deadline
    #[serde(default)]
    pub answer_deadline_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default log level when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON-formatted log lines
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Enable CORS origin checks
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// CORS allowed origins
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
            cors_origins: Vec::new(),
        }
    }
}

/// Language gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Allow-list of language codes
    #[serde(default = "default_allowed_languages")]
    pub allowed: Vec<String>,

    /// Input shorter than this (alphanumeric characters) passes the gate
    /// unclassified; classifiers are unreliable on short strings
    #[serde(default = "default_min_classify_chars")]
    pub min_classify_chars: usize,

    /// Classifier confidence below this triggers the heuristic fallback
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_allowed_languages() -> Vec<String> {
    vec!["en".to_string(), "hi".to_string(), "mr".to_string()]
}

fn default_min_classify_chars() -> usize {
    10
}

fn default_confidence_threshold() -> f32 {
    0.5
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            allowed: default_allowed_languages(),
            min_classify_chars: default_min_classify_chars(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl LanguageConfig {
    /// Parse the allow-list into `Language` values, skipping unknown codes
    pub fn allowed_languages(&self) -> Vec<Language> {
        self.allowed
            .iter()
            .filter_map(|code| Language::from_str_loose(code))
            .collect()
    }
}

/// Cache capacities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Textual answer cache capacity
    #[serde(default = "default_answer_capacity")]
    pub answer_capacity: usize,

    /// Synthesized audio cache capacity
    #[serde(default = "default_audio_capacity")]
    pub audio_capacity: usize,
}

fn default_answer_capacity() -> usize {
    50
}

fn default_audio_capacity() -> usize {
    20
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            answer_capacity: default_answer_capacity(),
            audio_capacity: default_audio_capacity(),
        }
    }
}

/// Retry/backoff policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts per upstream call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff delay in milliseconds; attempt `n` sleeps
    /// `(n + 1) * base_delay_ms`
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Comprehensive-query expansion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    /// Pause between alternate-phrasing sub-queries, to stay under
    /// upstream rate limits
    #[serde(default = "default_inter_query_delay_ms")]
    pub inter_query_delay_ms: u64,

    /// Below this many extracted names, one broader fallback query is
    /// issued
    #[serde(default = "default_min_results")]
    pub min_results: usize,
}

fn default_inter_query_delay_ms() -> u64 {
    1000
}

fn default_min_results() -> usize {
    3
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            inter_query_delay_ms: default_inter_query_delay_ms(),
            min_results: default_min_results(),
        }
    }
}

/// Conversation context store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum tracked sessions before FIFO eviction
    #[serde(default = "default_session_capacity")]
    pub session_capacity: usize,

    /// Collapse all requests onto a single shared session. Matches the
    /// original single-operator deployment; leave off for multi-user use.
    #[serde(default)]
    pub shared_session: bool,
}

fn default_session_capacity() -> usize {
    100
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            session_capacity: default_session_capacity(),
            shared_session: false,
        }
    }
}

/// Retrieval-generation service endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_upstream_endpoint")]
    pub endpoint: String,

    /// Bearer token, if the service requires one
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_upstream_endpoint() -> String {
    "http://localhost:9000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_upstream_endpoint(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Speech services endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_speech_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_speech_endpoint() -> String {
    "http://localhost:9100".to_string()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: default_speech_endpoint(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.answer_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.answer_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.cache.audio_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cache.audio_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry.max_retries".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if self.context.session_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "context.session_capacity".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.languages.confidence_threshold) {
            return Err(ConfigError::InvalidValue {
                field: "languages.confidence_threshold".to_string(),
                message: format!(
                    "Must be between 0.0 and 1.0, got {}",
                    self.languages.confidence_threshold
                ),
            });
        }

        let allowed = self.languages.allowed_languages();
        if allowed.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "languages.allowed".to_string(),
                message: format!(
                    "No recognized language codes in {:?}",
                    self.languages.allowed
                ),
            });
        }

        if allowed.len() < self.languages.allowed.len() {
            tracing::warn!(
                configured = ?self.languages.allowed,
                recognized = ?allowed,
                "Some configured language codes were not recognized and will be ignored"
            );
        }

        Ok(())
    }
}

/// Load settings from config files and environment
///
/// Priority: env vars > `config/{env}.yaml` > `config/default.yaml` >
/// built-in defaults.
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("SAHAYAK")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.cache.answer_capacity, 50);
        assert_eq!(settings.cache.audio_capacity, 20);
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.answer_deadline_seconds, 0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_allowed_languages_parsed() {
        let settings = Settings::default();
        let allowed = settings.languages.allowed_languages();
        assert_eq!(
            allowed,
            vec![Language::English, Language::Hindi, Language::Marathi]
        );
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let mut settings = Settings::default();
        settings.cache.answer_capacity = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_unknown_languages_only() {
        let mut settings = Settings::default();
        settings.languages.allowed = vec!["xx".to_string(), "yy".to_string()];
        assert!(settings.validate().is_err());
    }
}
