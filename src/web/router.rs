//! Router configuration for Web API.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::WebConfig;

use super::error::ApiError;
use super::handlers::{fetch_test, rss_supplement, AppState};
use super::middleware::create_cors_layer;

/// Create the main API router.
///
/// Every route, including `/health`, is wrapped in request tracing, CORS
/// and panic recovery.
pub fn create_router(app_state: Arc<AppState>, config: &WebConfig) -> Router {
    let api_routes = Router::new()
        .route("/rss-supplement", get(rss_supplement))
        .route("/fetch-test", get(fetch_test));

    let routes = Router::new()
        .nest("/api", api_routes)
        .merge(create_health_router());

    with_layers(routes, config).with_state(app_state)
}

/// Wrap routes in request tracing, CORS and panic recovery.
///
/// CORS sits outside panic recovery so error responses carry the
/// allow-origin header too.
fn with_layers<S>(routes: Router<S>, config: &WebConfig) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(create_cors_layer(&config.cors_origins))
            .layer(CatchPanicLayer::custom(ApiError::from_panic)),
    )
}

/// Create a health check router.
pub fn create_health_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
