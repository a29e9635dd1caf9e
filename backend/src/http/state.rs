//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::db::repository::FullRepository;
use crate::services::assistant::HealthAssistant;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Record store
    pub repository: Arc<dyn FullRepository>,
    /// Checks admin bearer tokens on write endpoints
    pub verifier: Arc<dyn TokenVerifier>,
    pub assistant: Arc<dyn HealthAssistant>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        verifier: Arc<dyn TokenVerifier>,
        assistant: Arc<dyn HealthAssistant>,
    ) -> Self {
        Self {
            repository,
            verifier,
            assistant,
        }
    }
}
