//! Ember Core - Entity Types
//!
//! Pure data structures for the post engagement subsystem. All other
//! crates depend on this. This crate contains ONLY data types and the
//! error taxonomy - no business logic, no storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod entities;
pub mod enums;
pub mod error;

pub use entities::{Interaction, PostEngagement, PostStats};
pub use enums::{EntityType, InteractionType};
pub use error::{EmberError, EmberResult, EngagementError, StorageError};

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Post identifier using UUIDv7 for timestamp-sortable IDs.
/// The post row itself is owned by the post-management subsystem; this
/// core only references it.
pub type PostId = Uuid;

/// Identifier of a reacting user. Reference only - user rows are owned
/// by the authentication subsystem.
pub type UserId = Uuid;

/// Interaction (ledger row) identifier.
pub type InteractionId = Uuid;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Generate a new UUIDv7 entity id (timestamp-sortable).
pub fn new_entity_id() -> Uuid {
    Uuid::now_v7()
}
