//! Error Types for the Ember API
//!
//! Defines error handling for the HTTP layer: a structured `ApiError`
//! response body, an `ErrorCode` enum mapping to HTTP status codes, and
//! the conversion from the domain's `EmberError` that implements the
//! propagation policy - domain errors carry a user-facing message,
//! consistency failures are logged and genericized.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ember_core::{EmberError, EngagementError, EntityType, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each code maps to a specific HTTP status code and represents a
/// category of failure an engagement operation can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Request lacks a valid caller identity
    Unauthorized,

    /// Request contains invalid input data
    InvalidInput,

    /// Caller already holds the reaction they tried to add
    AlreadyReacted,

    /// Caller holds no reaction of the kind they tried to remove
    InteractionNotFound,

    /// Referenced post does not exist
    PostNotFound,

    /// Requested entity does not exist
    EntityNotFound,

    /// Entity with the same identifier already exists
    EntityAlreadyExists,

    /// Concurrent modification detected; retry the whole operation
    ConcurrentModification,

    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,

            // Client errors on the engagement verbs are 400 (the post
            // exists, the request just conflicts with the ledger state).
            ErrorCode::InvalidInput
            | ErrorCode::AlreadyReacted
            | ErrorCode::InteractionNotFound => StatusCode::BAD_REQUEST,

            ErrorCode::PostNotFound | ErrorCode::EntityNotFound => StatusCode::NOT_FOUND,

            ErrorCode::EntityAlreadyExists | ErrorCode::ConcurrentModification => {
                StatusCode::CONFLICT
            }

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::AlreadyReacted => "Reaction already recorded",
            ErrorCode::InteractionNotFound => "No such interaction",
            ErrorCode::PostNotFound => "Post not found",
            ErrorCode::EntityNotFound => "Entity not found",
            ErrorCode::EntityAlreadyExists => "Entity already exists",
            ErrorCode::ConcurrentModification => "Concurrent modification detected",
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default
    /// message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    /// Create an Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Create a PostNotFound error.
    pub fn post_not_found(post_id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::PostNotFound, format!("Post {} not found", post_id))
    }

    /// Create an EntityNotFound error.
    pub fn entity_not_found(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityNotFound,
            format!("{} with id {} not found", entity_type, id),
        )
    }

    /// Create an EntityAlreadyExists error.
    pub fn entity_already_exists(entity_type: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::EntityAlreadyExists,
            format!("{} with id {} already exists", entity_type, id),
        )
    }

    /// Create a ConcurrentModification error.
    pub fn concurrent_modification(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConcurrentModification, message)
    }

    /// Create an InternalError.
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Implement IntoResponse for ApiError to enable automatic error
/// handling in Axum handlers.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM DOMAIN ERRORS
// ============================================================================

/// Convert from the domain's `EmberError`, implementing the propagation
/// policy: domain conflicts keep their user-facing message; consistency
/// and infrastructure failures are logged in full and returned generic.
impl From<EmberError> for ApiError {
    fn from(err: EmberError) -> Self {
        match err {
            EmberError::Engagement(engagement) => {
                let message = engagement.to_string();
                match engagement {
                    EngagementError::PostNotFound { post_id } => ApiError::post_not_found(post_id),
                    EngagementError::InteractionNotFound { .. } => {
                        ApiError::new(ErrorCode::InteractionNotFound, message)
                    }
                    EngagementError::AlreadyReacted { .. } => {
                        ApiError::new(ErrorCode::AlreadyReacted, message)
                    }
                    EngagementError::CounterInconsistent { .. } => {
                        // Ledger/counter drift is an internal defect:
                        // full detail to the log, nothing to the caller.
                        tracing::error!("Engagement consistency failure: {}", message);
                        ApiError::from_code(ErrorCode::InternalError)
                    }
                }
            }
            EmberError::Storage(storage) => match storage {
                StorageError::NotFound {
                    entity_type: EntityType::Post,
                    id,
                } => ApiError::post_not_found(id),
                StorageError::NotFound { entity_type, id } => {
                    ApiError::entity_not_found(&format!("{:?}", entity_type), id)
                }
                StorageError::InsertFailed { entity_type, reason } => ApiError::new(
                    ErrorCode::EntityAlreadyExists,
                    format!("{:?} insert failed: {}", entity_type, reason),
                ),
                StorageError::ConstraintViolation { constraint, .. } => ApiError::new(
                    ErrorCode::EntityAlreadyExists,
                    format!("Constraint {} violated", constraint),
                ),
                StorageError::TransactionConflict { .. } => ApiError::concurrent_modification(
                    "Operation conflicted with a concurrent request; retry the whole operation",
                ),
                StorageError::TransactionClosed | StorageError::LockPoisoned => {
                    tracing::error!("Storage failure: {}", storage);
                    ApiError::from_code(ErrorCode::InternalError)
                }
            },
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
