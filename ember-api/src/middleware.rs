//! Caller Identity Extraction
//!
//! The caller's identity is resolved by the upstream authentication
//! collaborator (session service, gateway, ...) and conveyed to this
//! core as the `x-ember-user-id` header. This module provides the typed
//! extractor; nothing here parses credentials.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use ember_core::UserId;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the authenticated caller's user id.
pub const CALLER_USER_ID_HEADER: &str = "x-ember-user-id";

/// Typed extractor for the authenticated caller.
///
/// # Example
///
/// ```ignore
/// async fn handler(CallerIdentity(user_id): CallerIdentity) -> String {
///     user_id.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CallerIdentity(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CALLER_USER_ID_HEADER)
            .ok_or_else(|| {
                ApiError::unauthorized(format!("Missing {} header", CALLER_USER_ID_HEADER))
            })?;
        let value = value.to_str().map_err(|_| {
            ApiError::unauthorized(format!("Invalid {} header", CALLER_USER_ID_HEADER))
        })?;
        let user_id = value.parse::<Uuid>().map_err(|_| {
            ApiError::unauthorized(format!(
                "Invalid {} header: expected a UUID",
                CALLER_USER_ID_HEADER
            ))
        })?;
        Ok(CallerIdentity(user_id))
    }
}

impl std::ops::Deref for CallerIdentity {
    type Target = UserId;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// =============================================================================
// TESTS
// =============================================================================
