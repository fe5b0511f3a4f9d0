//! REST API Routes Module
//!
//! Route handlers for the engagement verbs, health probes, and (behind
//! the `dev` feature) post seeding, plus the assembled application
//! router with CORS and request tracing.

#[cfg(feature = "dev")]
pub mod dev;
pub mod engagement;
pub mod health;

use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::middleware::CALLER_USER_ID_HEADER;
use crate::state::AppState;

/// Assemble the application router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let posts_router = engagement::create_router();
    #[cfg(feature = "dev")]
    let posts_router = posts_router.merge(dev::create_router());

    let router = Router::new()
        .nest("/api/v1/posts", posts_router)
        .merge(health::create_router());

    #[cfg(feature = "openapi")]
    let router = router.route(
        "/api/v1/openapi.json",
        axum::routing::get(|| async {
            axum::Json(<crate::openapi::ApiDoc as utoipa::OpenApi>::openapi())
        }),
    );

    router
        .layer(build_cors_layer(config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let allow_origin = if config.cors_origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(CALLER_USER_ID_HEADER),
        ])
        .max_age(Duration::from_secs(config.cors_max_age_secs))
}
