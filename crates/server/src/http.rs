//! HTTP endpoints
//!
//! Thin REST surface over the orchestrator. Handlers translate between
//! JSON and the orchestrator's types; no policy lives here.

use axum::{
    body::Bytes,
    extract::{Json, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use sahayak_core::error::SpeechError;
use sahayak_core::language::Language;
use sahayak_core::types::CacheStatus;

use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(
        &state.settings.server.cors_origins,
        state.settings.server.cors_enabled,
    );

    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/ask", post(ask))
        .route("/api/speak", post(speak))
        .route("/api/transcribe", post(transcribe))
        .route("/api/admin/clear-cache", post(clear_cache))
        .route("/api/admin/clear-context", post(clear_context))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins.
///
/// - `cors_enabled: false` returns a permissive layer (development only)
/// - No configured origins defaults to localhost:3000
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::info!("No CORS origins configured, defaulting to localhost:3000");
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static("http://localhost:3000"))
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed.len());
    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Mint a session id for a new conversation. Clients thread this id
/// through `/api/ask` so follow-up resolution stays per conversation.
async fn create_session() -> Json<serde_json::Value> {
    let session_id = uuid::Uuid::new_v4().to_string();
    tracing::debug!(session = %session_id, "session created");
    Json(serde_json::json!({ "session_id": session_id }))
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    query: String,
    /// Conversation session; omitted means the default session
    session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    text: String,
    language: Option<String>,
    cache_status: CacheStatus,
}

/// Answer a query
async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Json<AskResponse> {
    let session_id = request.session_id.as_deref().unwrap_or("default");
    let response = state.orchestrator.answer(session_id, &request.query).await;
    Json(AskResponse {
        text: response.text,
        language: response.language.map(|l| l.code().to_string()),
        cache_status: response.cache_status,
    })
}

#[derive(Debug, Deserialize)]
struct SpeakRequest {
    text: String,
    /// Language code; omitted or "auto" means detect from the text
    language: Option<String>,
    #[serde(default = "default_speed")]
    speed: f32,
}

fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Serialize)]
struct SpeakResponseBody {
    /// Base64-encoded audio bytes
    audio: String,
    language: String,
    cache_hit: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Synthesize speech for a piece of text
async fn speak(
    State(state): State<AppState>,
    Json(request): Json<SpeakRequest>,
) -> Result<Json<SpeakResponseBody>, (StatusCode, Json<ErrorBody>)> {
    let preference = match request.language.as_deref() {
        None | Some("auto") => None,
        Some(code) => match Language::from_str_loose(code) {
            Some(language) => Some(language),
            None => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Unsupported language code: {}", code),
                ))
            }
        },
    };

    match state
        .orchestrator
        .speak(&request.text, preference, request.speed)
        .await
    {
        Ok(response) => Ok(Json(SpeakResponseBody {
            audio: BASE64.encode(&response.audio),
            language: response.language.code().to_string(),
            cache_hit: response.cache_hit,
        })),
        Err(err) => Err(speech_error_response(err)),
    }
}

#[derive(Debug, Serialize)]
struct TranscribeResponse {
    text: String,
}

/// Transcribe an audio clip posted as a raw body
async fn transcribe(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TranscribeResponse>, (StatusCode, Json<ErrorBody>)> {
    match state.transcriber.transcribe(&body).await {
        Ok(text) => Ok(Json(TranscribeResponse { text })),
        Err(err) => Err(speech_error_response(err)),
    }
}

fn speech_error_response(err: SpeechError) -> (StatusCode, Json<ErrorBody>) {
    let status = match err {
        SpeechError::EmptyText | SpeechError::UnsupportedLanguage => StatusCode::BAD_REQUEST,
        SpeechError::NoSpeechDetected => StatusCode::UNPROCESSABLE_ENTITY,
        SpeechError::Synthesis(_) | SpeechError::Transcription(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(status, err.to_string())
}

fn error_response(status: StatusCode, message: String) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: message }))
}

/// Clear both result caches
async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.orchestrator.clear_cache();
    Json(serde_json::json!({ "status": "cleared" }))
}

/// Clear all conversation context
async fn clear_context(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.orchestrator.clear_context();
    Json(serde_json::json!({ "status": "cleared" }))
}

/// Health check
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::util::ServiceExt;

    use sahayak_config::Settings;
    use sahayak_core::error::{SpeechError, UpstreamError};
    use sahayak_core::traits::{
        RetrievalGenerator, SpeechSynthesizer, SpeechToText,
    };
    use sahayak_orchestrator::{OrchestratorConfig, QueryOrchestrator};

    struct FixedBackend(String);

    #[async_trait::async_trait]
    impl RetrievalGenerator for FixedBackend {
        async fn invoke(&self, _query: &str) -> Result<String, UpstreamError> {
            Ok(self.0.clone())
        }
    }

    struct FixedSynthesizer;

    #[async_trait::async_trait]
    impl SpeechSynthesizer for FixedSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            _language: Language,
            _speed: f32,
        ) -> Result<Vec<u8>, SpeechError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    struct FixedTranscriber;

    #[async_trait::async_trait]
    impl SpeechToText for FixedTranscriber {
        async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError> {
            if audio.is_empty() {
                return Err(SpeechError::NoSpeechDetected);
            }
            Ok("transcribed".to_string())
        }
    }

    fn test_router() -> Router {
        let settings = Settings::default();
        let orchestrator = Arc::new(QueryOrchestrator::new(
            OrchestratorConfig::from(&settings),
            Arc::new(FixedBackend(
                "Janani Suraksha Yojana provides cash assistance for institutional deliveries."
                    .to_string(),
            )),
            Arc::new(FixedSynthesizer),
        ));
        create_router(AppState::new(orchestrator, Arc::new(FixedTranscriber), settings))
    }

    #[tokio::test]
    async fn health_returns_ok() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn ask_round_trip() {
        let request = Request::post("/api/ask")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"query": "What is Janani Suraksha Yojana?"}"#,
            ))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed["text"]
            .as_str()
            .unwrap()
            .contains("Janani Suraksha Yojana"));
        assert_eq!(parsed["cache_status"], "stored");
    }

    #[tokio::test]
    async fn create_session_mints_an_id() {
        let response = test_router()
            .oneshot(Request::post("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(!parsed["session_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transcribe_empty_body_is_unprocessable() {
        let request = Request::post("/api/transcribe")
            .header("content-type", "application/octet-stream")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn speak_rejects_unknown_language_code() {
        let request = Request::post("/api/speak")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"text": "some scheme details", "language": "fr"}"#))
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
