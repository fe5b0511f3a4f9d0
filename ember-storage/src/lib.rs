//! Ember Storage - Interaction Ledger
//!
//! Defines the storage abstraction for the engagement subsystem: the
//! ledger of per-user reactions and the engagement view of each post.
//! Every mutating operation of the engagement service runs inside one
//! unit of work obtained from [`StorageTrait::begin`]; the backend is
//! responsible for atomicity, for the uniqueness constraint on
//! `(user_id, post_id)`, and for detecting conflicting concurrent
//! commits.
//!
//! The in-memory backend lives in [`memory`]. A SQL-backed
//! implementation would provide the same two traits on top of database
//! transactions.

pub mod memory;

pub use memory::InMemoryStorage;

use ember_core::{
    EmberResult, Interaction, InteractionId, InteractionType, PostEngagement, PostId, UserId,
};

// ============================================================================
// TRANSACTION TRAIT
// ============================================================================

/// One atomic unit of work against the ledger and the post counters.
///
/// All reads record what was observed; [`commit`](Self::commit)
/// validates those observations against the committed state and either
/// applies every buffered write or applies nothing. Dropping a
/// transaction without committing rolls it back.
///
/// Commit failure modes:
/// - `StorageError::TransactionConflict` - a row or pair lookup read by
///   this transaction was changed by a concurrent commit. The whole
///   operation may be retried.
/// - `StorageError::ConstraintViolation` - an inserted interaction lost
///   the race for its `(user_id, post_id)` slot. The uniqueness index is
///   the correctness backstop behind the service's friendlier
///   application-level check.
pub trait TransactionTrait: Send {
    /// Read the engagement view of a post.
    fn post_get(&mut self, post_id: PostId) -> EmberResult<Option<PostEngagement>>;

    /// Buffer a rewrite of a post's counters (read-then-write).
    /// Fails with `NotFound` if the post was never observed to exist.
    fn post_put(&mut self, engagement: PostEngagement) -> EmberResult<()>;

    /// Exact lookup by the `(post_id, user_id)` composite key.
    fn interaction_find(
        &mut self,
        post_id: PostId,
        user_id: UserId,
    ) -> EmberResult<Option<Interaction>>;

    /// Buffer insertion of a new ledger row.
    fn interaction_insert(&mut self, interaction: &Interaction) -> EmberResult<()>;

    /// Buffer a mutation of a row's `interaction_type` only.
    fn interaction_update_type(
        &mut self,
        interaction_id: InteractionId,
        new_type: InteractionType,
    ) -> EmberResult<()>;

    /// Buffer deletion of a ledger row.
    fn interaction_delete(&mut self, interaction_id: InteractionId) -> EmberResult<()>;

    /// Validate the read set and apply every buffered write atomically.
    fn commit(self: Box<Self>) -> EmberResult<()>;
}

// ============================================================================
// STORAGE TRAIT
// ============================================================================

/// Storage backend for the engagement subsystem.
///
/// Point reads outside a transaction see the latest committed state.
/// Post rows are seeded by the external post-management collaborator
/// (via `post_insert`) and only their counters are ever rewritten here.
pub trait StorageTrait: Send + Sync {
    /// Open a unit of work.
    fn begin(&self) -> EmberResult<Box<dyn TransactionTrait + '_>>;

    /// Read the engagement view of a post.
    fn post_get(&self, post_id: PostId) -> EmberResult<Option<PostEngagement>>;

    /// Seed a post's engagement view. `metadata` carries the rest of the
    /// post row opaquely; this core never interprets it.
    fn post_insert(
        &self,
        engagement: &PostEngagement,
        metadata: Option<serde_json::Value>,
    ) -> EmberResult<()>;

    /// Delete a post and cascade-delete its ledger rows.
    fn post_delete(&self, post_id: PostId) -> EmberResult<()>;

    /// Exact lookup by the `(post_id, user_id)` composite key.
    fn interaction_find(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> EmberResult<Option<Interaction>>;

    /// Re-derive a counter from the ledger. Used by repair/consistency
    /// checks, not on the hot path.
    fn interaction_count_by_type(
        &self,
        post_id: PostId,
        interaction_type: InteractionType,
    ) -> EmberResult<i64>;
}
