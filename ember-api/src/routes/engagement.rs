//! Engagement REST API Routes
//!
//! Axum route handlers mapping the five engagement verbs onto the
//! counter service. Mutating handlers return the post's updated stats
//! so toggle-style clients can render the new counts without a second
//! round trip.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use ember_core::InteractionType;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CallerIdentity,
    state::{AppState, SharedService},
};

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// POST /api/v1/posts/{id}/like - Like a post
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/like",
    tag = "Engagement",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Like recorded", body = ember_core::PostStats),
        (status = 400, description = "Post already liked", body = ApiError),
        (status = 401, description = "Missing caller identity", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
)]
pub async fn like_post(
    State(service): State<SharedService>,
    CallerIdentity(user_id): CallerIdentity,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    service.add_interaction(id, user_id, InteractionType::Like)?;
    let stats = service.get_stats(id)?;
    Ok(Json(stats))
}

/// DELETE /api/v1/posts/{id}/like - Remove a like
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/like",
    tag = "Engagement",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Like removed", body = ember_core::PostStats),
        (status = 400, description = "No like interaction found", body = ApiError),
        (status = 401, description = "Missing caller identity", body = ApiError),
    ),
)]
pub async fn unlike_post(
    State(service): State<SharedService>,
    CallerIdentity(user_id): CallerIdentity,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    service.remove_interaction(id, user_id, InteractionType::Like)?;
    let stats = service.get_stats(id)?;
    Ok(Json(stats))
}

/// POST /api/v1/posts/{id}/burn - Burn a post
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/burn",
    tag = "Engagement",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Burn recorded", body = ember_core::PostStats),
        (status = 400, description = "Post already burned", body = ApiError),
        (status = 401, description = "Missing caller identity", body = ApiError),
        (status = 404, description = "Post not found", body = ApiError),
    ),
)]
pub async fn burn_post(
    State(service): State<SharedService>,
    CallerIdentity(user_id): CallerIdentity,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    service.add_interaction(id, user_id, InteractionType::Burn)?;
    let stats = service.get_stats(id)?;
    Ok(Json(stats))
}

/// DELETE /api/v1/posts/{id}/burn - Remove a burn
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/burn",
    tag = "Engagement",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Burn removed", body = ember_core::PostStats),
        (status = 400, description = "No burn interaction found", body = ApiError),
        (status = 401, description = "Missing caller identity", body = ApiError),
    ),
)]
pub async fn unburn_post(
    State(service): State<SharedService>,
    CallerIdentity(user_id): CallerIdentity,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    service.remove_interaction(id, user_id, InteractionType::Burn)?;
    let stats = service.get_stats(id)?;
    Ok(Json(stats))
}

/// GET /api/v1/posts/{id}/stats - Read the counter snapshot
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/stats",
    tag = "Engagement",
    params(
        ("id" = Uuid, Path, description = "Post ID")
    ),
    responses(
        (status = 200, description = "Counter snapshot", body = ember_core::PostStats),
        (status = 404, description = "Post not found", body = ApiError),
    ),
)]
pub async fn post_stats(
    State(service): State<SharedService>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let stats = service.get_stats(id)?;
    Ok(Json(stats))
}

// ============================================================================
// ROUTER SETUP
// ============================================================================

/// Create the engagement routes router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/:id/like", axum::routing::post(like_post))
        .route("/:id/like", axum::routing::delete(unlike_post))
        .route("/:id/burn", axum::routing::post(burn_post))
        .route("/:id/burn", axum::routing::delete(unburn_post))
        .route("/:id/stats", axum::routing::get(post_stats))
}
