//! Router construction and shared application state.
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use reqwest::Client;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::api::handlers;
use crate::config::{BackendSettings, SettingsSource};

/// Request body cap; base64 photos routinely exceed axum's 2 MB default.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

pub struct AppState {
    pub http: Client,
    pub settings: SettingsSource,
}

impl AppState {
    /// State that re-reads backend settings from the environment per request.
    pub fn from_env() -> Self {
        AppState { http: Client::new(), settings: SettingsSource::Env }
    }

    pub fn with_settings(settings: BackendSettings) -> Self {
        AppState { http: Client::new(), settings: SettingsSource::Fixed(settings) }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route(
            "/api/generate",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/api/match_hairstyle",
            post(handlers::match_hairstyle).fallback(handlers::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
