//! Configuration management for the scheme assistant
//!
//! Supports loading configuration from:
//! - YAML files (`config/default.yaml`, `config/{env}.yaml`)
//! - Environment variables (`SAHAYAK__` prefix, `__` separator)

pub mod settings;

pub use settings::{
    load_settings, CacheConfig, ContextConfig, ExpansionConfig, LanguageConfig,
    ObservabilityConfig, RetryConfig, ServerConfig, Settings, SpeechConfig, UpstreamConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
