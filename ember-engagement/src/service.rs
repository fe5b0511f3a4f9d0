//! Engagement counter service.
//!
//! Business logic for add/remove/query of post reactions. Each mutating
//! operation is one unit of work: the ledger read, the ledger write and
//! the counter rewrite commit or roll back together. Commit-time
//! conflicts are retried here with fresh state, bounded by
//! [`DEFAULT_MAX_TX_RETRIES`].

use std::sync::Arc;

use ember_core::{
    EmberError, EmberResult, EngagementError, Interaction, InteractionType, PostId, PostStats,
    StorageError, UserId,
};
use ember_storage::{StorageTrait, TransactionTrait};

/// Default retry budget for conflicted transactions.
///
/// A conflict can only be caused by a competitor that committed, so
/// every retry follows system-wide progress; the budget only has to
/// cover realistic contention on a single post.
pub const DEFAULT_MAX_TX_RETRIES: u32 = 32;

/// The only component permitted to mutate post counters.
///
/// Stateless between calls: no counter cache, every operation reads
/// current storage state.
pub struct EngagementService<S: StorageTrait> {
    storage: Arc<S>,
    max_retries: u32,
}

impl<S: StorageTrait> Clone for EngagementService<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            max_retries: self.max_retries,
        }
    }
}

impl<S: StorageTrait> EngagementService<S> {
    /// Create a service over the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            max_retries: DEFAULT_MAX_TX_RETRIES,
        }
    }

    /// Override the conflict retry budget (mainly for tests).
    pub fn with_max_retries(storage: Arc<S>, max_retries: u32) -> Self {
        Self {
            storage,
            max_retries,
        }
    }

    /// The underlying storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Record that `user_id` reacts to `post_id` with `interaction_type`.
    ///
    /// First-time reaction inserts a ledger row and increments the
    /// matching counter. A reaction of the kind the user already holds
    /// fails with `AlreadyReacted` and mutates nothing. A reaction of
    /// the other kind switches the existing row in place, moving one
    /// count from the old counter to the new one - a single logical
    /// operation, never remove-then-add.
    pub fn add_interaction(
        &self,
        post_id: PostId,
        user_id: UserId,
        interaction_type: InteractionType,
    ) -> EmberResult<()> {
        self.with_conflict_retry("add_interaction", || {
            self.try_add(post_id, user_id, interaction_type)
        })
    }

    /// Remove the `interaction_type` reaction `user_id` holds on
    /// `post_id`, decrementing the matching counter.
    pub fn remove_interaction(
        &self,
        post_id: PostId,
        user_id: UserId,
        interaction_type: InteractionType,
    ) -> EmberResult<()> {
        self.with_conflict_retry("remove_interaction", || {
            self.try_remove(post_id, user_id, interaction_type)
        })
    }

    /// Read the counter snapshot for a post. Pure counter read, no
    /// ledger access.
    pub fn get_stats(&self, post_id: PostId) -> EmberResult<PostStats> {
        let engagement = self
            .storage
            .post_get(post_id)?
            .ok_or(EngagementError::PostNotFound { post_id })?;
        Ok(engagement.stats())
    }

    /// Consistency check: re-derive both counters from the ledger and
    /// compare. Off the hot path; used for repair and in tests as the
    /// invariant oracle.
    pub fn verify_counters(&self, post_id: PostId) -> EmberResult<bool> {
        let engagement = self
            .storage
            .post_get(post_id)?
            .ok_or(EngagementError::PostNotFound { post_id })?;
        let ledger_likes = self
            .storage
            .interaction_count_by_type(post_id, InteractionType::Like)?;
        let ledger_burns = self
            .storage
            .interaction_count_by_type(post_id, InteractionType::Burn)?;

        let consistent =
            engagement.like_count == ledger_likes && engagement.burn_count == ledger_burns;
        if !consistent {
            tracing::warn!(
                %post_id,
                like_count = engagement.like_count,
                ledger_likes,
                burn_count = engagement.burn_count,
                ledger_burns,
                "post counters disagree with the interaction ledger"
            );
        }
        Ok(consistent)
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    fn with_conflict_retry<F>(&self, operation: &'static str, attempt_fn: F) -> EmberResult<()>
    where
        F: Fn() -> EmberResult<()>,
    {
        let mut last_conflict = None;
        for attempt in 1..=self.max_retries {
            match attempt_fn() {
                Err(err) if err.is_transaction_conflict() => {
                    tracing::debug!(operation, attempt, "transaction conflict, retrying");
                    last_conflict = Some(err);
                }
                other => return other,
            }
        }
        tracing::warn!(
            operation,
            retries = self.max_retries,
            "transaction conflict retry budget exhausted"
        );
        Err(last_conflict.unwrap_or_else(|| {
            StorageError::TransactionConflict {
                reason: format!("{} retry budget exhausted", operation),
            }
            .into()
        }))
    }

    fn try_add(
        &self,
        post_id: PostId,
        user_id: UserId,
        interaction_type: InteractionType,
    ) -> EmberResult<()> {
        let mut tx = self.storage.begin()?;
        let mut post = tx
            .post_get(post_id)?
            .ok_or(EngagementError::PostNotFound { post_id })?;

        match tx.interaction_find(post_id, user_id)? {
            Some(existing) if existing.interaction_type == interaction_type => {
                // Toggle-style clients only call add when the reaction is
                // not active; a second add of the same kind is a client
                // error, not idempotent success.
                Err(EngagementError::AlreadyReacted {
                    post_id,
                    interaction_type,
                }
                .into())
            }
            Some(existing) => {
                tx.interaction_update_type(existing.interaction_id, interaction_type)?;
                post.increment(interaction_type);
                if let Err(err) = post.decrement(existing.interaction_type) {
                    tracing::error!(%post_id, %user_id, "counter drift detected during switch: {}", err);
                    return Err(err.into());
                }
                tx.post_put(post)?;
                tx.commit()
            }
            None => {
                let interaction = Interaction::new(post_id, user_id, interaction_type);
                if let Err(err) = tx.interaction_insert(&interaction) {
                    return Err(Self::map_pair_violation(err, post_id, interaction_type));
                }
                post.increment(interaction_type);
                tx.post_put(post)?;
                tx.commit()
                    .map_err(|err| Self::map_pair_violation(err, post_id, interaction_type))
            }
        }
    }

    fn try_remove(
        &self,
        post_id: PostId,
        user_id: UserId,
        interaction_type: InteractionType,
    ) -> EmberResult<()> {
        let mut tx = self.storage.begin()?;
        let interaction = tx
            .interaction_find(post_id, user_id)?
            .filter(|i| i.interaction_type == interaction_type)
            .ok_or(EngagementError::InteractionNotFound {
                post_id,
                interaction_type,
            })?;

        tx.interaction_delete(interaction.interaction_id)?;

        let mut post = tx
            .post_get(post_id)?
            .ok_or(EngagementError::PostNotFound { post_id })?;
        if let Err(err) = post.decrement(interaction_type) {
            tracing::error!(%post_id, %user_id, "counter drift detected during removal: {}", err);
            return Err(err.into());
        }
        tx.post_put(post)?;
        tx.commit()
    }

    /// The uniqueness index firing concurrently means the caller already
    /// holds a reaction; normalize to the same domain error the
    /// application-level check produces.
    fn map_pair_violation(
        err: EmberError,
        post_id: PostId,
        interaction_type: InteractionType,
    ) -> EmberError {
        match err {
            EmberError::Storage(StorageError::ConstraintViolation { .. }) => {
                EngagementError::AlreadyReacted {
                    post_id,
                    interaction_type,
                }
                .into()
            }
            other => other,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
