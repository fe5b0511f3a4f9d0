//! Core entity structures

use crate::{
    new_entity_id, EngagementError, InteractionId, InteractionType, PostId, Timestamp, UserId,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Interaction - one row of the engagement ledger.
///
/// Records that `user_id` holds a `interaction_type` reaction toward
/// `post_id`. At most one row exists per `(user_id, post_id)` pair at any
/// committed state; the pair is covered by a uniqueness constraint inside
/// the storage engine. The row's `interaction_type` is mutated in place
/// when the user switches reaction kinds; `created_at` is immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Interaction {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub interaction_id: InteractionId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub user_id: UserId,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub interaction_type: InteractionType,
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub created_at: Timestamp,
}

impl Interaction {
    /// Build a fresh ledger row for a first-time reaction.
    pub fn new(post_id: PostId, user_id: UserId, interaction_type: InteractionType) -> Self {
        Self {
            interaction_id: new_entity_id(),
            user_id,
            post_id,
            interaction_type,
            created_at: Utc::now(),
        }
    }
}

/// PostEngagement - the engagement view of a post.
///
/// The post row itself (title, media, giveaway fields, ...) is owned by
/// the post-management subsystem; this core reads and rewrites only the
/// two denormalized counters. Invariant: after every committed operation
/// each counter equals the number of ledger rows of the matching type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostEngagement {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub like_count: i64,
    pub burn_count: i64,
}

impl PostEngagement {
    /// Fresh engagement view with both counters at zero.
    pub fn new(post_id: PostId) -> Self {
        Self {
            post_id,
            like_count: 0,
            burn_count: 0,
        }
    }

    /// Current value of the counter matching `interaction_type`.
    pub fn count(&self, interaction_type: InteractionType) -> i64 {
        match interaction_type {
            InteractionType::Like => self.like_count,
            InteractionType::Burn => self.burn_count,
        }
    }

    /// Increment the counter matching `interaction_type` by one.
    pub fn increment(&mut self, interaction_type: InteractionType) {
        match interaction_type {
            InteractionType::Like => self.like_count += 1,
            InteractionType::Burn => self.burn_count += 1,
        }
    }

    /// Decrement the counter matching `interaction_type` by one.
    ///
    /// Counters never go negative: a decrement that would do so means
    /// ledger and counters have diverged, and fails with
    /// `CounterInconsistent` instead of clamping.
    pub fn decrement(
        &mut self,
        interaction_type: InteractionType,
    ) -> Result<(), EngagementError> {
        let counter = match interaction_type {
            InteractionType::Like => &mut self.like_count,
            InteractionType::Burn => &mut self.burn_count,
        };
        if *counter <= 0 {
            return Err(EngagementError::CounterInconsistent {
                post_id: self.post_id,
                interaction_type,
            });
        }
        *counter -= 1;
        Ok(())
    }

    /// Snapshot the counters as the wire-facing stats payload.
    pub fn stats(&self) -> PostStats {
        PostStats {
            post_id: self.post_id,
            likes: self.like_count,
            burns: self.burn_count,
        }
    }
}

/// Wire-facing counter snapshot returned by the stats query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PostStats {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "uuid"))]
    pub post_id: PostId,
    pub likes: i64,
    pub burns: i64,
}

// ============================================================================
// TESTS
// ============================================================================
