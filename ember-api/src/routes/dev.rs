//! Development Seeding Routes
//!
//! Post lifecycle is owned by the external post-management
//! collaborator. These routes exist only behind the `dev` feature so
//! the API can run stand-alone in development and tests: they seed a
//! post's engagement view (and delete it, cascading its ledger rows).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_core::{new_entity_id, PostEngagement, PostId};
use ember_storage::StorageTrait;

use crate::{
    error::ApiResult,
    state::{ApiStorage, AppState},
};

/// Request body for seeding a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CreatePostRequest {
    /// Explicit id; generated when omitted.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>, format = "uuid"))]
    pub post_id: Option<PostId>,
    /// Collaborator-owned post fields, carried opaquely.
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub metadata: Option<serde_json::Value>,
}

/// POST /api/v1/posts - Seed a post (dev only)
pub async fn create_post(
    State(storage): State<Arc<ApiStorage>>,
    Json(req): Json<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let post_id = req.post_id.unwrap_or_else(new_entity_id);
    let engagement = PostEngagement::new(post_id);
    storage.post_insert(&engagement, req.metadata)?;
    Ok((StatusCode::CREATED, Json(engagement)))
}

/// DELETE /api/v1/posts/{id} - Delete a post and its ledger rows (dev only)
pub async fn delete_post(
    State(storage): State<Arc<ApiStorage>>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    storage.post_delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create the dev seeding routes router.
pub fn create_router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", axum::routing::post(create_post))
        .route("/:id", axum::routing::delete(delete_post))
}
