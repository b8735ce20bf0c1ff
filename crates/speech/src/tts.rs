//! Speech-synthesis client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;

use sahayak_config::SpeechConfig;
use sahayak_core::{Language, SpeechError, SpeechSynthesizer};

/// Speed below this maps to the synthesizer's "slow" mode; the upstream
/// engine only distinguishes normal and slow speech.
const SLOW_SPEECH_THRESHOLD: f32 = 0.8;

/// Synthesis client speaking a minimal JSON protocol:
/// `POST {endpoint}/tts {"text", "language", "slow"}` → audio bytes.
#[derive(Clone)]
pub struct HttpSynthesizer {
    client: Client,
    config: SpeechConfig,
}

impl HttpSynthesizer {
    pub fn new(config: SpeechConfig) -> Result<Self, crate::SpeechClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| crate::SpeechClientError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn tts_url(&self) -> String {
        format!("{}/tts", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        language: Language,
        speed: f32,
    ) -> Result<Vec<u8>, SpeechError> {
        let request = TtsRequest {
            text,
            language: language.code(),
            slow: speed < SLOW_SPEECH_THRESHOLD,
        };

        let response = self
            .client
            .post(self.tts_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("transport: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNPROCESSABLE_ENTITY {
                return Err(SpeechError::UnsupportedLanguage);
            }
            tracing::warn!(%status, "speech synthesis failed");
            return Err(SpeechError::Synthesis(format!("{}: {}", status, body)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Synthesis(format!("body: {}", e)))?;

        if bytes.is_empty() {
            return Err(SpeechError::Synthesis("empty audio response".to_string()));
        }

        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    language: &'a str,
    slow: bool,
}
