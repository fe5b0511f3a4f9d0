//! OpenAPI Documentation
//!
//! Aggregates the utoipa path and schema definitions into one document,
//! served at `/api/v1/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ember Engagement API",
        description = "Like/burn engagement counters for posts, backed by the interaction ledger",
    ),
    paths(
        crate::routes::engagement::like_post,
        crate::routes::engagement::unlike_post,
        crate::routes::engagement::burn_post,
        crate::routes::engagement::unburn_post,
        crate::routes::engagement::post_stats,
        crate::routes::health::ping,
        crate::routes::health::liveness,
        crate::routes::health::readiness,
    ),
    components(schemas(
        ember_core::PostStats,
        ember_core::PostEngagement,
        ember_core::InteractionType,
        crate::error::ApiError,
        crate::error::ErrorCode,
        crate::routes::health::HealthResponse,
        crate::routes::health::HealthStatus,
    )),
    tags(
        (name = "Engagement", description = "Like/burn operations and counter queries"),
        (name = "Health", description = "Liveness and readiness probes"),
    )
)]
pub struct ApiDoc;
