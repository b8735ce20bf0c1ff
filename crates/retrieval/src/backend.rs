//! HTTP retrieval-generation backend

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sahayak_config::UpstreamConfig;
use sahayak_core::{RetrievalGenerator, UpstreamError};

/// Construction-time error for the HTTP client
#[derive(Error, Debug)]
pub enum RetrievalClientError {
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Retrieval-generation backend speaking a minimal JSON protocol:
/// `POST {endpoint}/query {"query": "..."}` → `{"answer": "..."}`.
#[derive(Clone)]
pub struct HttpRetrievalBackend {
    client: Client,
    config: UpstreamConfig,
}

impl HttpRetrievalBackend {
    pub fn new(config: UpstreamConfig) -> Result<Self, RetrievalClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RetrievalClientError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn query_url(&self) -> String {
        format!("{}/query", self.config.endpoint.trim_end_matches('/'))
    }

    /// Map an HTTP status to the upstream failure taxonomy
    fn classify_status(status: StatusCode, body: &str) -> UpstreamError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => UpstreamError::RateLimited,
            StatusCode::PAYLOAD_TOO_LARGE => UpstreamError::PayloadTooLarge,
            _ => UpstreamError::Other(format!("{}: {}", status, body)),
        }
    }
}

#[async_trait]
impl RetrievalGenerator for HttpRetrievalBackend {
    async fn invoke(&self, query: &str) -> Result<String, UpstreamError> {
        let request = QueryRequest { query };

        let mut builder = self.client.post(self.query_url()).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Other(format!("transport: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Self::classify_status(status, &body);
            tracing::warn!(%status, error = %err, "retrieval-generation call failed");
            return Err(err);
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Other(format!("invalid response: {}", e)))?;

        Ok(parsed.answer)
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    answer: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(
            HttpRetrievalBackend::classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            UpstreamError::RateLimited
        );
        assert_eq!(
            HttpRetrievalBackend::classify_status(StatusCode::PAYLOAD_TOO_LARGE, ""),
            UpstreamError::PayloadTooLarge
        );
        assert!(matches!(
            HttpRetrievalBackend::classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            UpstreamError::Other(_)
        ));
    }

    #[test]
    fn test_query_url_trims_trailing_slash() {
        let backend = HttpRetrievalBackend::new(UpstreamConfig {
            endpoint: "http://localhost:9000/".to_string(),
            api_key: None,
            timeout_seconds: 5,
        })
        .unwrap();
        assert_eq!(backend.query_url(), "http://localhost:9000/query");
    }
}
