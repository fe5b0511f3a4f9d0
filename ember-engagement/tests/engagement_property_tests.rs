//! Property and scenario tests for the engagement counter service.
//!
//! The invariant oracle throughout is `verify_counters`: after every
//! committed operation each post counter must equal the number of
//! ledger rows of the matching type.

use std::sync::Arc;
use std::thread;

use ember_engagement::EngagementService;
use ember_test_utils::{
    new_entity_id, seed_post, test_storage, EmberError, EngagementError, InMemoryStorage,
    InteractionType,
};
use proptest::prelude::*;

fn make_service() -> EngagementService<InMemoryStorage> {
    EngagementService::new(test_storage())
}

// ============================================================================
// SCENARIO TESTS
// ============================================================================

/// The full two-user walkthrough: like, burn, switch, remove.
#[test]
fn test_two_user_scenario() {
    let service = make_service();
    let post_id = seed_post(service.storage());
    let user_a = new_entity_id();
    let user_b = new_entity_id();

    service
        .add_interaction(post_id, user_a, InteractionType::Like)
        .unwrap();
    let stats = service.get_stats(post_id).unwrap();
    assert_eq!((stats.likes, stats.burns), (1, 0));

    service
        .add_interaction(post_id, user_b, InteractionType::Burn)
        .unwrap();
    let stats = service.get_stats(post_id).unwrap();
    assert_eq!((stats.likes, stats.burns), (1, 1));

    // A switches like -> burn
    service
        .add_interaction(post_id, user_a, InteractionType::Burn)
        .unwrap();
    let stats = service.get_stats(post_id).unwrap();
    assert_eq!((stats.likes, stats.burns), (0, 2));

    // B removes their burn
    service
        .remove_interaction(post_id, user_b, InteractionType::Burn)
        .unwrap();
    let stats = service.get_stats(post_id).unwrap();
    assert_eq!((stats.likes, stats.burns), (0, 1));

    assert!(service.verify_counters(post_id).unwrap());
}

#[test]
fn test_error_scenarios() {
    let service = make_service();
    let post_id = seed_post(service.storage());

    let err = service.get_stats(new_entity_id()).unwrap_err();
    assert!(matches!(
        err,
        EmberError::Engagement(EngagementError::PostNotFound { .. })
    ));

    let err = service
        .remove_interaction(post_id, new_entity_id(), InteractionType::Like)
        .unwrap_err();
    assert!(matches!(
        err,
        EmberError::Engagement(EngagementError::InteractionNotFound {
            interaction_type: InteractionType::Like,
            ..
        })
    ));
}

// ============================================================================
// CONCURRENCY TESTS
// ============================================================================

/// N distinct users like one post concurrently: no lost updates, the
/// counter converges to N with exactly N ledger rows.
#[test]
fn test_concurrent_likes_converge() {
    const USERS: usize = 16;

    let service = Arc::new(make_service());
    let post_id = seed_post(service.storage());

    let handles: Vec<_> = (0..USERS)
        .map(|_| {
            let service = Arc::clone(&service);
            let user_id = new_entity_id();
            thread::spawn(move || {
                service
                    .add_interaction(post_id, user_id, InteractionType::Like)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = service.get_stats(post_id).unwrap();
    assert_eq!(stats.likes, USERS as i64);
    assert_eq!(stats.burns, 0);
    assert_eq!(service.storage().interaction_count(), USERS);
    assert!(service.verify_counters(post_id).unwrap());
}

/// The same user racing two first-time reactions: exactly one row wins,
/// the loser gets the same domain error as a sequential duplicate.
#[test]
fn test_concurrent_same_pair_single_row() {
    const ROUNDS: usize = 8;

    for _ in 0..ROUNDS {
        let service = Arc::new(make_service());
        let post_id = seed_post(service.storage());
        let user_id = new_entity_id();

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                thread::spawn(move || {
                    service.add_interaction(post_id, user_id, InteractionType::Like)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        for result in results {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    EmberError::Engagement(EngagementError::AlreadyReacted { .. })
                ));
            }
        }
        assert_eq!(service.storage().interaction_count(), 1);
        let stats = service.get_stats(post_id).unwrap();
        assert_eq!(stats.likes, 1);
        assert!(service.verify_counters(post_id).unwrap());
    }
}

/// Mixed concurrent adds and removes across several users keep the
/// ledger/counter invariant at every end state.
#[test]
fn test_concurrent_mixed_operations_stay_consistent() {
    const USERS: usize = 8;

    let service = Arc::new(make_service());
    let post_id = seed_post(service.storage());
    let users: Vec<_> = (0..USERS).map(|_| new_entity_id()).collect();

    // Everyone likes first.
    for user_id in &users {
        service
            .add_interaction(post_id, *user_id, InteractionType::Like)
            .unwrap();
    }

    // Half switch to burn, half remove their like, concurrently.
    let handles: Vec<_> = users
        .iter()
        .enumerate()
        .map(|(i, user_id)| {
            let service = Arc::clone(&service);
            let user_id = *user_id;
            thread::spawn(move || {
                if i % 2 == 0 {
                    service.add_interaction(post_id, user_id, InteractionType::Burn)
                } else {
                    service.remove_interaction(post_id, user_id, InteractionType::Like)
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let stats = service.get_stats(post_id).unwrap();
    assert_eq!(stats.likes, 0);
    assert_eq!(stats.burns, (USERS / 2) as i64);
    assert_eq!(service.storage().interaction_count(), USERS / 2);
    assert!(service.verify_counters(post_id).unwrap());
}

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum Op {
    Add(InteractionType),
    Remove(InteractionType),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Add(InteractionType::Like)),
        Just(Op::Add(InteractionType::Burn)),
        Just(Op::Remove(InteractionType::Like)),
        Just(Op::Remove(InteractionType::Burn)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Property: for any sequence of add/remove operations from a small
    /// pool of users, successful or not, the counters always equal the
    /// ledger counts and each user holds at most one reaction.
    #[test]
    fn prop_counters_always_match_ledger(
        ops in proptest::collection::vec((0usize..4, op_strategy()), 1..48)
    ) {
        let service = make_service();
        let post_id = seed_post(service.storage());
        let users: Vec<_> = (0..4).map(|_| new_entity_id()).collect();

        for (user_index, op) in ops {
            let user_id = users[user_index];
            // Individual operations may fail (AlreadyReacted, no such
            // interaction); the invariant must survive regardless.
            let _ = match op {
                Op::Add(ty) => service.add_interaction(post_id, user_id, ty),
                Op::Remove(ty) => service.remove_interaction(post_id, user_id, ty),
            };
            prop_assert!(service.verify_counters(post_id).unwrap());
        }

        let stats = service.get_stats(post_id).unwrap();
        prop_assert!(stats.likes >= 0 && stats.burns >= 0);
        prop_assert!((stats.likes + stats.burns) as usize <= users.len());
    }

    /// Property: add-then-remove of the same kind is always a no-op on
    /// the counters, whatever state the other users are in.
    #[test]
    fn prop_add_remove_roundtrip_restores_stats(
        like in any::<bool>(),
        bystanders in 0usize..4,
    ) {
        let service = make_service();
        let post_id = seed_post(service.storage());
        let ty = if like { InteractionType::Like } else { InteractionType::Burn };

        for _ in 0..bystanders {
            service.add_interaction(post_id, new_entity_id(), InteractionType::Like).unwrap();
        }
        let before = service.get_stats(post_id).unwrap();

        let user_id = new_entity_id();
        service.add_interaction(post_id, user_id, ty).unwrap();
        service.remove_interaction(post_id, user_id, ty).unwrap();

        let after = service.get_stats(post_id).unwrap();
        prop_assert_eq!(before, after);
    }
}
