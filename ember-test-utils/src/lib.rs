//! Ember Test Utilities
//!
//! Centralized test infrastructure for the Ember workspace: seeded
//! storage fixtures and interaction factories shared by the engagement
//! and API test suites.

use std::sync::Arc;

// Re-export the in-memory backend from its source crate
pub use ember_storage::InMemoryStorage;

// Re-export core types for convenience
pub use ember_core::{
    new_entity_id, EmberError, EmberResult, EngagementError, EntityType, Interaction,
    InteractionId, InteractionType, PostEngagement, PostId, PostStats, StorageError, Timestamp,
    UserId,
};

use ember_storage::StorageTrait;

/// Fresh empty storage behind an `Arc`, ready to share across threads.
pub fn test_storage() -> Arc<InMemoryStorage> {
    Arc::new(InMemoryStorage::new())
}

/// Seed a post with zeroed counters and return its id.
pub fn seed_post(storage: &InMemoryStorage) -> PostId {
    let post_id = new_entity_id();
    storage
        .post_insert(&PostEngagement::new(post_id), None)
        .expect("seed post");
    post_id
}

/// Seed a post carrying opaque collaborator-owned fields, the way the
/// post-management subsystem would create it.
pub fn seed_post_with_metadata(storage: &InMemoryStorage, metadata: serde_json::Value) -> PostId {
    let post_id = new_entity_id();
    storage
        .post_insert(&PostEngagement::new(post_id), Some(metadata))
        .expect("seed post");
    post_id
}

/// Build a ledger row for tests.
pub fn make_interaction(post_id: PostId, interaction_type: InteractionType) -> Interaction {
    Interaction::new(post_id, new_entity_id(), interaction_type)
}
