use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use log::warn;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::di::ServiceContainer;

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;

pub use error::ErrorServer;

/// Builds the HTTP API over the given services
pub fn create_router(services: Arc<ServiceContainer>, allowed_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/crypto/top/{limit}", get(handlers::top_assets))
        .route("/crypto/search", get(handlers::search))
        .route("/crypto/sync-top-cryptos", post(handlers::sync_top_assets))
        .route("/crypto/cleanup-old-data", delete(handlers::cleanup_old_data))
        .route("/crypto/{id}", get(handlers::asset))
        .route("/crypto/{id}/price-trend", get(handlers::price_trend));

    Router::new()
        .route("/", get(handlers::info))
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
