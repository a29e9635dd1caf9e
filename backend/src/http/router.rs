//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The frontend is served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Doctors
        .route(
            "/doctors",
            get(handlers::list_doctors).post(handlers::create_doctor),
        )
        .route(
            "/doctors/{id}",
            put(handlers::update_doctor).delete(handlers::delete_doctor),
        )
        // Hospitals
        .route(
            "/hospitals",
            get(handlers::list_hospitals).post(handlers::create_hospital),
        )
        .route(
            "/hospitals/{id}",
            put(handlers::update_hospital).delete(handlers::delete_hospital),
        )
        // Donors
        .route(
            "/donors",
            get(handlers::list_donors).post(handlers::register_donor),
        )
        .route("/donors/pending", get(handlers::list_pending_donors))
        .route("/donors/approved", get(handlers::list_approved_donors))
        .route("/donors/export", get(handlers::export_donors))
        .route(
            "/donors/{id}",
            put(handlers::update_donor).delete(handlers::delete_donor),
        )
        .route(
            "/donors/{id}/availability",
            put(handlers::set_donor_availability),
        )
        .route("/donors/{id}/approve", post(handlers::approve_donor))
        // Donation requests
        .route(
            "/donation-requests",
            get(handlers::list_donation_requests).post(handlers::submit_donation_request),
        )
        .route(
            "/donation-requests/export",
            get(handlers::export_donation_requests),
        )
        .route(
            "/donation-requests/{id}",
            put(handlers::update_donation_request).delete(handlers::delete_donation_request),
        )
        .route(
            "/donation-requests/{id}/approve",
            post(handlers::approve_donation_request),
        )
        // Settings, dashboard, assistant
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/stats", get(handlers::dashboard_stats))
        .route("/assistant", post(handlers::ask_assistant));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenVerifier;
    use crate::db::repositories::LocalRepository;
    use crate::services::assistant::{AssistantConfig, GeminiAssistant};
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(
            Arc::new(LocalRepository::new()),
            Arc::new(StaticTokenVerifier::new()),
            Arc::new(GeminiAssistant::new(AssistantConfig::default()).unwrap()),
        );
        let _router = create_router(state);
    }
}
