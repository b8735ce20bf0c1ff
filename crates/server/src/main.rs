//! Server entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use sahayak_config::{load_settings, Settings};
use sahayak_core::traits::SpeechToText;
use sahayak_orchestrator::{OrchestratorConfig, QueryOrchestrator};
use sahayak_retrieval::HttpRetrievalBackend;
use sahayak_server::{create_router, AppState};
use sahayak_speech::{HttpSynthesizer, HttpTranscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("SAHAYAK_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => {
            // Tracing not yet initialized, use eprintln for early logging
            eprintln!(
                "Loaded configuration (env: {})",
                env.as_deref().unwrap_or("default")
            );
            settings
        }
        Err(e) => {
            eprintln!("Warning: failed to load config: {}. Using defaults.", e);
            Settings::default()
        }
    };

    init_tracing(&settings);
    tracing::info!("Starting scheme assistant server v{}", env!("CARGO_PKG_VERSION"));

    let backend = Arc::new(HttpRetrievalBackend::new(settings.upstream.clone())?);
    let synthesizer = Arc::new(HttpSynthesizer::new(settings.speech.clone())?);
    let transcriber: Arc<dyn SpeechToText> =
        Arc::new(HttpTranscriber::new(settings.speech.clone())?);

    let orchestrator = Arc::new(QueryOrchestrator::new(
        OrchestratorConfig::from(&settings),
        backend,
        synthesizer,
    ));

    tracing::info!(
        upstream = %settings.upstream.endpoint,
        speech = %settings.speech.endpoint,
        allowed_languages = ?settings.languages.allowed,
        "Initialized application state"
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let app = create_router(AppState::new(orchestrator, transcriber, settings));

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("sahayak={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
