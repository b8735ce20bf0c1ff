//! Speech-to-text client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use sahayak_config::SpeechConfig;
use sahayak_core::{SpeechError, SpeechToText};

/// Transcription client: `POST {endpoint}/transcribe` with raw audio
/// bytes → `{"text": "..."}`.
#[derive(Clone)]
pub struct HttpTranscriber {
    client: Client,
    config: SpeechConfig,
}

impl HttpTranscriber {
    pub fn new(config: SpeechConfig) -> Result<Self, crate::SpeechClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| crate::SpeechClientError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn transcribe_url(&self) -> String {
        format!("{}/transcribe", self.config.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechToText for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::NoSpeechDetected);
        }

        let response = self
            .client
            .post(self.transcribe_url())
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| SpeechError::Transcription(format!("transport: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Err(SpeechError::NoSpeechDetected);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNPROCESSABLE_ENTITY => SpeechError::UnsupportedLanguage,
                StatusCode::NOT_FOUND => SpeechError::NoSpeechDetected,
                _ => SpeechError::Transcription(format!("{}: {}", status, body)),
            });
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Transcription(format!("invalid response: {}", e)))?;

        if parsed.text.trim().is_empty() {
            return Err(SpeechError::NoSpeechDetected);
        }

        Ok(parsed.text)
    }
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
}
