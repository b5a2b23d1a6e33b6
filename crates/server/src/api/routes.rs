use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::{addon, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Stremio clients load addons cross-origin, so CORS stays wide open.
    Router::new()
        .route("/manifest.json", get(addon::manifest))
        .route("/catalog/{type}/{id}", get(addon::catalog))
        .route("/catalog/{type}/{id}/{extra}", get(addon::catalog_with_extra))
        .route("/meta/{type}/{id}", get(addon::meta))
        .route("/stream/{type}/{id}", get(addon::stream))
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
