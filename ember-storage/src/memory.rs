//! In-memory transactional backend.
//!
//! Rows are versioned; transactions record the version of everything
//! they read (including pair lookups that found nothing) and validate
//! the whole read set under the write lock at commit. The first
//! committer wins; the loser fails with `TransactionConflict` and the
//! service retries the operation against fresh state. The
//! `(user_id, post_id)` uniqueness constraint is enforced here, at the
//! storage layer, so it holds even when two first-time reactions race
//! past the service's application-level check.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ember_core::{
    EmberError, EmberResult, EntityType, Interaction, InteractionId, InteractionType,
    PostEngagement, PostId, StorageError, UserId,
};

use crate::{StorageTrait, TransactionTrait};

/// Name of the uniqueness constraint on `(user_id, post_id)`.
pub const PAIR_UNIQUE_CONSTRAINT: &str = "interactions_user_post_unique";

#[derive(Debug, Clone)]
struct PostRow {
    engagement: PostEngagement,
    /// The rest of the post row, owned by the post-management
    /// collaborator. Carried opaquely, never interpreted.
    #[allow(dead_code)]
    metadata: Option<serde_json::Value>,
    version: u64,
}

#[derive(Debug, Clone)]
struct InteractionRow {
    interaction: Interaction,
    version: u64,
}

#[derive(Debug, Default)]
struct StoreInner {
    posts: HashMap<PostId, PostRow>,
    interactions: HashMap<InteractionId, InteractionRow>,
    /// Uniqueness index: at most one ledger row per `(user_id, post_id)`.
    pair_index: HashMap<(UserId, PostId), InteractionId>,
}

/// In-memory storage backend with optimistic transactions.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    inner: Arc<RwLock<StoreInner>>,
}

impl InMemoryStorage {
    /// Create a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        let mut inner = self.inner.write().unwrap();
        inner.posts.clear();
        inner.interactions.clear();
        inner.pair_index.clear();
    }

    /// Number of stored posts.
    pub fn post_count(&self) -> usize {
        self.inner.read().unwrap().posts.len()
    }

    /// Number of stored ledger rows.
    pub fn interaction_count(&self) -> usize {
        self.inner.read().unwrap().interactions.len()
    }

    fn read(&self) -> EmberResult<RwLockReadGuard<'_, StoreInner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::LockPoisoned.into())
    }

    fn write(&self) -> EmberResult<RwLockWriteGuard<'_, StoreInner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

fn conflict(reason: String) -> EmberError {
    StorageError::TransactionConflict { reason }.into()
}

// ============================================================================
// TRANSACTION
// ============================================================================

/// A unit of work over [`InMemoryStorage`].
///
/// Reads see committed state overlaid with this transaction's own
/// buffered writes. Nothing is visible to other transactions until
/// commit; dropping the transaction discards every buffered write.
pub struct MemoryTransaction<'a> {
    storage: &'a InMemoryStorage,
    // Read set: what was observed, keyed by row / pair. `None` records
    // that the row (or pair slot) was observed absent.
    post_reads: HashMap<PostId, Option<u64>>,
    interaction_reads: HashMap<InteractionId, Option<u64>>,
    pair_reads: HashMap<(UserId, PostId), Option<InteractionId>>,
    // Write set, applied at commit.
    post_writes: HashMap<PostId, PostEngagement>,
    inserts: HashMap<InteractionId, Interaction>,
    type_updates: HashMap<InteractionId, InteractionType>,
    deletes: HashSet<InteractionId>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(storage: &'a InMemoryStorage) -> Self {
        Self {
            storage,
            post_reads: HashMap::new(),
            interaction_reads: HashMap::new(),
            pair_reads: HashMap::new(),
            post_writes: HashMap::new(),
            inserts: HashMap::new(),
            type_updates: HashMap::new(),
            deletes: HashSet::new(),
        }
    }

    fn buffered_insert_for_pair(&self, post_id: PostId, user_id: UserId) -> Option<&Interaction> {
        self.inserts
            .values()
            .find(|i| i.post_id == post_id && i.user_id == user_id)
    }
}

impl TransactionTrait for MemoryTransaction<'_> {
    fn post_get(&mut self, post_id: PostId) -> EmberResult<Option<PostEngagement>> {
        if let Some(buffered) = self.post_writes.get(&post_id) {
            return Ok(Some(buffered.clone()));
        }
        let inner = self.storage.read()?;
        let row = inner.posts.get(&post_id);
        self.post_reads
            .entry(post_id)
            .or_insert(row.map(|r| r.version));
        Ok(row.map(|r| r.engagement.clone()))
    }

    fn post_put(&mut self, engagement: PostEngagement) -> EmberResult<()> {
        let post_id = engagement.post_id;
        match self.post_reads.entry(post_id) {
            Entry::Occupied(observed) => {
                if observed.get().is_none() {
                    return Err(StorageError::NotFound {
                        entity_type: EntityType::Post,
                        id: post_id,
                    }
                    .into());
                }
            }
            Entry::Vacant(slot) => {
                let inner = self.storage.read()?;
                match inner.posts.get(&post_id) {
                    Some(row) => {
                        slot.insert(Some(row.version));
                    }
                    None => {
                        return Err(StorageError::NotFound {
                            entity_type: EntityType::Post,
                            id: post_id,
                        }
                        .into())
                    }
                }
            }
        }
        self.post_writes.insert(post_id, engagement);
        Ok(())
    }

    fn interaction_find(
        &mut self,
        post_id: PostId,
        user_id: UserId,
    ) -> EmberResult<Option<Interaction>> {
        if let Some(buffered) = self.buffered_insert_for_pair(post_id, user_id) {
            return Ok(Some(buffered.clone()));
        }
        let pair = (user_id, post_id);
        let inner = self.storage.read()?;
        let committed = inner.pair_index.get(&pair).copied();
        self.pair_reads.entry(pair).or_insert(committed);

        let Some(interaction_id) = committed else {
            return Ok(None);
        };
        if self.deletes.contains(&interaction_id) {
            return Ok(None);
        }
        let Some(row) = inner.interactions.get(&interaction_id) else {
            return Ok(None);
        };
        self.interaction_reads
            .entry(interaction_id)
            .or_insert(Some(row.version));

        let mut interaction = row.interaction.clone();
        if let Some(new_type) = self.type_updates.get(&interaction_id) {
            interaction.interaction_type = *new_type;
        }
        Ok(Some(interaction))
    }

    fn interaction_insert(&mut self, interaction: &Interaction) -> EmberResult<()> {
        let pair = (interaction.user_id, interaction.post_id);
        if self
            .buffered_insert_for_pair(interaction.post_id, interaction.user_id)
            .is_some()
        {
            return Err(StorageError::ConstraintViolation {
                constraint: PAIR_UNIQUE_CONSTRAINT.to_string(),
                reason: format!(
                    "interaction already buffered for user {} on post {}",
                    interaction.user_id, interaction.post_id
                ),
            }
            .into());
        }

        let committed = {
            let inner = self.storage.read()?;
            inner.pair_index.get(&pair).copied()
        };
        self.pair_reads.entry(pair).or_insert(committed);
        if let Some(holder) = committed {
            if !self.deletes.contains(&holder) {
                return Err(StorageError::ConstraintViolation {
                    constraint: PAIR_UNIQUE_CONSTRAINT.to_string(),
                    reason: format!(
                        "interaction already exists for user {} on post {}",
                        interaction.user_id, interaction.post_id
                    ),
                }
                .into());
            }
        }
        self.inserts
            .insert(interaction.interaction_id, interaction.clone());
        Ok(())
    }

    fn interaction_update_type(
        &mut self,
        interaction_id: InteractionId,
        new_type: InteractionType,
    ) -> EmberResult<()> {
        if let Some(buffered) = self.inserts.get_mut(&interaction_id) {
            buffered.interaction_type = new_type;
            return Ok(());
        }
        if self.deletes.contains(&interaction_id) {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Interaction,
                id: interaction_id,
            }
            .into());
        }
        if let Entry::Vacant(slot) = self.interaction_reads.entry(interaction_id) {
            let inner = self.storage.read()?;
            match inner.interactions.get(&interaction_id) {
                Some(row) => {
                    slot.insert(Some(row.version));
                }
                None => {
                    return Err(StorageError::NotFound {
                        entity_type: EntityType::Interaction,
                        id: interaction_id,
                    }
                    .into())
                }
            }
        }
        self.type_updates.insert(interaction_id, new_type);
        Ok(())
    }

    fn interaction_delete(&mut self, interaction_id: InteractionId) -> EmberResult<()> {
        if self.inserts.remove(&interaction_id).is_some() {
            return Ok(());
        }
        if let Entry::Vacant(slot) = self.interaction_reads.entry(interaction_id) {
            let inner = self.storage.read()?;
            match inner.interactions.get(&interaction_id) {
                Some(row) => {
                    slot.insert(Some(row.version));
                }
                None => {
                    return Err(StorageError::NotFound {
                        entity_type: EntityType::Interaction,
                        id: interaction_id,
                    }
                    .into())
                }
            }
        }
        self.type_updates.remove(&interaction_id);
        self.deletes.insert(interaction_id);
        Ok(())
    }

    fn commit(self: Box<Self>) -> EmberResult<()> {
        let mut inner = self.storage.write()?;

        // Uniqueness backstop: an inserted pair must still be free,
        // unless this transaction is itself vacating the slot.
        for interaction in self.inserts.values() {
            let pair = (interaction.user_id, interaction.post_id);
            if let Some(holder) = inner.pair_index.get(&pair) {
                if !self.deletes.contains(holder) {
                    return Err(StorageError::ConstraintViolation {
                        constraint: PAIR_UNIQUE_CONSTRAINT.to_string(),
                        reason: format!(
                            "interaction already exists for user {} on post {}",
                            interaction.user_id, interaction.post_id
                        ),
                    }
                    .into());
                }
            }
            if inner.interactions.contains_key(&interaction.interaction_id) {
                return Err(StorageError::InsertFailed {
                    entity_type: EntityType::Interaction,
                    reason: format!("duplicate interaction_id {}", interaction.interaction_id),
                }
                .into());
            }
        }

        // First-committer-wins: every observed row and pair slot must be
        // unchanged, otherwise the whole unit of work must be redone.
        for (post_id, observed) in &self.post_reads {
            let current = inner.posts.get(post_id).map(|r| r.version);
            if current != *observed {
                return Err(conflict(format!("post {} changed since read", post_id)));
            }
        }
        for (interaction_id, observed) in &self.interaction_reads {
            let current = inner.interactions.get(interaction_id).map(|r| r.version);
            if current != *observed {
                return Err(conflict(format!(
                    "interaction {} changed since read",
                    interaction_id
                )));
            }
        }
        for ((user_id, post_id), observed) in &self.pair_reads {
            let current = inner.pair_index.get(&(*user_id, *post_id)).copied();
            if current != *observed {
                return Err(conflict(format!(
                    "reaction slot for user {} on post {} changed since read",
                    user_id, post_id
                )));
            }
        }

        // Apply. Validation holds the write lock, so nothing can change
        // between validation and application.
        for (interaction_id, new_type) in &self.type_updates {
            if let Some(row) = inner.interactions.get_mut(interaction_id) {
                row.interaction.interaction_type = *new_type;
                row.version += 1;
            }
        }
        for interaction_id in &self.deletes {
            if let Some(row) = inner.interactions.remove(interaction_id) {
                inner
                    .pair_index
                    .remove(&(row.interaction.user_id, row.interaction.post_id));
            }
        }
        for (interaction_id, interaction) in self.inserts {
            inner
                .pair_index
                .insert((interaction.user_id, interaction.post_id), interaction_id);
            inner
                .interactions
                .insert(interaction_id, InteractionRow {
                    interaction,
                    version: 1,
                });
        }
        for (post_id, engagement) in self.post_writes {
            if let Some(row) = inner.posts.get_mut(&post_id) {
                row.engagement = engagement;
                row.version += 1;
            }
        }
        Ok(())
    }
}

// ============================================================================
// STORAGE TRAIT IMPL
// ============================================================================

impl StorageTrait for InMemoryStorage {
    fn begin(&self) -> EmberResult<Box<dyn TransactionTrait + '_>> {
        Ok(Box::new(MemoryTransaction::new(self)))
    }

    fn post_get(&self, post_id: PostId) -> EmberResult<Option<PostEngagement>> {
        let inner = self.read()?;
        Ok(inner.posts.get(&post_id).map(|r| r.engagement.clone()))
    }

    fn post_insert(
        &self,
        engagement: &PostEngagement,
        metadata: Option<serde_json::Value>,
    ) -> EmberResult<()> {
        let mut inner = self.write()?;
        if inner.posts.contains_key(&engagement.post_id) {
            return Err(StorageError::InsertFailed {
                entity_type: EntityType::Post,
                reason: "already exists".to_string(),
            }
            .into());
        }
        inner.posts.insert(
            engagement.post_id,
            PostRow {
                engagement: engagement.clone(),
                metadata,
                version: 1,
            },
        );
        Ok(())
    }

    fn post_delete(&self, post_id: PostId) -> EmberResult<()> {
        let mut inner = self.write()?;
        if inner.posts.remove(&post_id).is_none() {
            return Err(StorageError::NotFound {
                entity_type: EntityType::Post,
                id: post_id,
            }
            .into());
        }
        // Exclusively owned relation: the post takes its ledger rows
        // with it.
        let doomed: Vec<InteractionId> = inner
            .interactions
            .values()
            .filter(|r| r.interaction.post_id == post_id)
            .map(|r| r.interaction.interaction_id)
            .collect();
        for interaction_id in doomed {
            if let Some(row) = inner.interactions.remove(&interaction_id) {
                inner
                    .pair_index
                    .remove(&(row.interaction.user_id, row.interaction.post_id));
            }
        }
        Ok(())
    }

    fn interaction_find(
        &self,
        post_id: PostId,
        user_id: UserId,
    ) -> EmberResult<Option<Interaction>> {
        let inner = self.read()?;
        let Some(interaction_id) = inner.pair_index.get(&(user_id, post_id)) else {
            return Ok(None);
        };
        Ok(inner
            .interactions
            .get(interaction_id)
            .map(|r| r.interaction.clone()))
    }

    fn interaction_count_by_type(
        &self,
        post_id: PostId,
        interaction_type: InteractionType,
    ) -> EmberResult<i64> {
        let inner = self.read()?;
        Ok(inner
            .interactions
            .values()
            .filter(|r| {
                r.interaction.post_id == post_id
                    && r.interaction.interaction_type == interaction_type
            })
            .count() as i64)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::new_entity_id;

    fn make_test_post(storage: &InMemoryStorage) -> PostId {
        let post_id = new_entity_id();
        storage
            .post_insert(&PostEngagement::new(post_id), None)
            .unwrap();
        post_id
    }

    fn make_test_interaction(post_id: PostId, interaction_type: InteractionType) -> Interaction {
        Interaction::new(post_id, new_entity_id(), interaction_type)
    }

    #[test]
    fn test_post_insert_get() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);

        let engagement = storage.post_get(post_id).unwrap().unwrap();
        assert_eq!(engagement.post_id, post_id);
        assert_eq!(engagement.like_count, 0);
        assert_eq!(engagement.burn_count, 0);
    }

    #[test]
    fn test_post_insert_duplicate() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);

        let result = storage.post_insert(&PostEngagement::new(post_id), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_transaction_insert_commit_visible() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let interaction = make_test_interaction(post_id, InteractionType::Like);

        let mut tx = storage.begin().unwrap();
        tx.interaction_insert(&interaction).unwrap();
        // Not visible to point reads until commit.
        assert!(storage
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .is_none());
        tx.commit().unwrap();

        let found = storage
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.interaction_id, interaction.interaction_id);
    }

    #[test]
    fn test_transaction_drop_rolls_back() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let interaction = make_test_interaction(post_id, InteractionType::Burn);

        {
            let mut tx = storage.begin().unwrap();
            tx.interaction_insert(&interaction).unwrap();
            // dropped without commit
        }
        assert_eq!(storage.interaction_count(), 0);
    }

    #[test]
    fn test_read_your_writes_within_transaction() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let interaction = make_test_interaction(post_id, InteractionType::Like);

        let mut tx = storage.begin().unwrap();
        tx.interaction_insert(&interaction).unwrap();
        let found = tx
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.interaction_id, interaction.interaction_id);

        tx.interaction_update_type(interaction.interaction_id, InteractionType::Burn)
            .unwrap();
        let found = tx
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.interaction_type, InteractionType::Burn);
    }

    #[test]
    fn test_unique_pair_enforced_across_transactions() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let user_id = new_entity_id();

        // Two racing transactions both pass the application-level check
        // (neither sees a committed row) and both insert.
        let mut tx1 = storage.begin().unwrap();
        let mut tx2 = storage.begin().unwrap();
        assert!(tx1.interaction_find(post_id, user_id).unwrap().is_none());
        assert!(tx2.interaction_find(post_id, user_id).unwrap().is_none());
        tx1.interaction_insert(&Interaction::new(post_id, user_id, InteractionType::Like))
            .unwrap();
        tx2.interaction_insert(&Interaction::new(post_id, user_id, InteractionType::Like))
            .unwrap();

        tx1.commit().unwrap();
        let err = tx2.commit().unwrap_err();
        assert!(matches!(
            err,
            EmberError::Storage(StorageError::ConstraintViolation { .. })
        ));
        assert_eq!(storage.interaction_count(), 1);
    }

    #[test]
    fn test_concurrent_counter_writes_conflict() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);

        // Two transactions read the same post version and both rewrite
        // the counters; the second commit must not silently lose the
        // first one's update.
        let mut tx1 = storage.begin().unwrap();
        let mut tx2 = storage.begin().unwrap();
        let mut post1 = tx1.post_get(post_id).unwrap().unwrap();
        let mut post2 = tx2.post_get(post_id).unwrap().unwrap();
        post1.increment(InteractionType::Like);
        post2.increment(InteractionType::Like);
        tx1.post_put(post1).unwrap();
        tx2.post_put(post2).unwrap();

        tx1.commit().unwrap();
        let err = tx2.commit().unwrap_err();
        assert!(err.is_transaction_conflict());

        let engagement = storage.post_get(post_id).unwrap().unwrap();
        assert_eq!(engagement.like_count, 1);
    }

    #[test]
    fn test_stale_pair_read_conflicts() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let user_id = new_entity_id();

        // tx2 observed an empty slot but never inserts; a competitor
        // fills the slot, so tx2's read set is stale.
        let mut tx1 = storage.begin().unwrap();
        let mut tx2 = storage.begin().unwrap();
        assert!(tx2.interaction_find(post_id, user_id).unwrap().is_none());
        tx1.interaction_insert(&Interaction::new(post_id, user_id, InteractionType::Like))
            .unwrap();
        tx1.commit().unwrap();

        let mut post = tx2.post_get(post_id).unwrap().unwrap();
        post.increment(InteractionType::Burn);
        tx2.post_put(post).unwrap();
        let err = tx2.commit().unwrap_err();
        assert!(err.is_transaction_conflict());
    }

    #[test]
    fn test_update_type_and_delete() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let interaction = make_test_interaction(post_id, InteractionType::Like);

        let mut tx = storage.begin().unwrap();
        tx.interaction_insert(&interaction).unwrap();
        tx.commit().unwrap();

        let mut tx = storage.begin().unwrap();
        tx.interaction_update_type(interaction.interaction_id, InteractionType::Burn)
            .unwrap();
        tx.commit().unwrap();
        let found = storage
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.interaction_type, InteractionType::Burn);

        let mut tx = storage.begin().unwrap();
        tx.interaction_delete(interaction.interaction_id).unwrap();
        tx.commit().unwrap();
        assert!(storage
            .interaction_find(post_id, interaction.user_id)
            .unwrap()
            .is_none());
        assert_eq!(storage.interaction_count(), 0);
    }

    #[test]
    fn test_delete_missing_interaction_fails() {
        let storage = InMemoryStorage::new();
        let mut tx = storage.begin().unwrap();
        let err = tx.interaction_delete(new_entity_id()).unwrap_err();
        assert!(matches!(
            err,
            EmberError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_post_put_missing_post_fails() {
        let storage = InMemoryStorage::new();
        let mut tx = storage.begin().unwrap();
        let err = tx.post_put(PostEngagement::new(new_entity_id())).unwrap_err();
        assert!(matches!(
            err,
            EmberError::Storage(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_post_delete_cascades_interactions() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);
        let other_post = make_test_post(&storage);

        let mut tx = storage.begin().unwrap();
        tx.interaction_insert(&make_test_interaction(post_id, InteractionType::Like))
            .unwrap();
        tx.interaction_insert(&make_test_interaction(post_id, InteractionType::Burn))
            .unwrap();
        tx.interaction_insert(&make_test_interaction(other_post, InteractionType::Like))
            .unwrap();
        tx.commit().unwrap();
        assert_eq!(storage.interaction_count(), 3);

        storage.post_delete(post_id).unwrap();
        assert_eq!(storage.post_count(), 1);
        assert_eq!(storage.interaction_count(), 1);
        assert_eq!(
            storage
                .interaction_count_by_type(other_post, InteractionType::Like)
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_count_by_type() {
        let storage = InMemoryStorage::new();
        let post_id = make_test_post(&storage);

        let mut tx = storage.begin().unwrap();
        tx.interaction_insert(&make_test_interaction(post_id, InteractionType::Like))
            .unwrap();
        tx.interaction_insert(&make_test_interaction(post_id, InteractionType::Like))
            .unwrap();
        tx.interaction_insert(&make_test_interaction(post_id, InteractionType::Burn))
            .unwrap();
        tx.commit().unwrap();

        assert_eq!(
            storage
                .interaction_count_by_type(post_id, InteractionType::Like)
                .unwrap(),
            2
        );
        assert_eq!(
            storage
                .interaction_count_by_type(post_id, InteractionType::Burn)
                .unwrap(),
            1
        );
    }
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
