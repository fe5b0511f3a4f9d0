//! Error types for Ember operations

use crate::{EntityType, InteractionType, PostId};
use thiserror::Error;
use uuid::Uuid;

/// Storage layer errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Entity not found: {entity_type:?} with id {id}")]
    NotFound { entity_type: EntityType, id: Uuid },

    #[error("Insert failed for {entity_type:?}: {reason}")]
    InsertFailed { entity_type: EntityType, reason: String },

    #[error("Constraint violation on {constraint}: {reason}")]
    ConstraintViolation { constraint: String, reason: String },

    #[error("Transaction conflict: {reason}")]
    TransactionConflict { reason: String },

    #[error("Transaction already committed or rolled back")]
    TransactionClosed,

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Domain errors of the engagement counter service.
///
/// These carry enough detail to render a user-facing message. The
/// exception is `CounterInconsistent`, which indicates ledger/counter
/// drift: it is logged at high severity and surfaced as a generic
/// internal failure, never exposing internal state to callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngagementError {
    #[error("Post {post_id} not found")]
    PostNotFound { post_id: PostId },

    #[error("No {interaction_type} interaction found")]
    InteractionNotFound {
        post_id: PostId,
        interaction_type: InteractionType,
    },

    #[error("Post already {}", .interaction_type.past_tense())]
    AlreadyReacted {
        post_id: PostId,
        interaction_type: InteractionType,
    },

    #[error("Counter for {interaction_type} on post {post_id} would go negative")]
    CounterInconsistent {
        post_id: PostId,
        interaction_type: InteractionType,
    },
}

/// Master error type for all Ember errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmberError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Engagement error: {0}")]
    Engagement(#[from] EngagementError),
}

impl EmberError {
    /// Whether this error is a commit-time transaction conflict.
    /// Conflicted operations may be retried whole; nothing else should
    /// be retried automatically.
    pub fn is_transaction_conflict(&self) -> bool {
        matches!(
            self,
            EmberError::Storage(StorageError::TransactionConflict { .. })
        )
    }
}

/// Result type alias for Ember operations.
pub type EmberResult<T> = Result<T, EmberError>;

// =============================================================================
// TESTS
// =============================================================================
