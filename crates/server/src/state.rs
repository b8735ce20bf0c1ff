//! Shared application state

use std::sync::Arc;

use sahayak_config::Settings;
use sahayak_core::traits::SpeechToText;
use sahayak_orchestrator::QueryOrchestrator;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<QueryOrchestrator>,
    pub transcriber: Arc<dyn SpeechToText>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<QueryOrchestrator>,
        transcriber: Arc<dyn SpeechToText>,
        settings: Settings,
    ) -> Self {
        Self {
            orchestrator,
            transcriber,
            settings: Arc::new(settings),
        }
    }
}
