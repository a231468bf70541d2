//! Pool lifecycle through the engine: creation, effective status, locks and
//! halts.

use chrono::Duration;
use linepool::domain::error::DomainError;
use linepool::domain::id::PoolId;
use linepool::domain::pool::{PoolStatus, Side, Winner};
use linepool::error::{Error, IntegrityError, SettlementError};
use linepool::port::inbound::pools::PoolApi;
use linepool::port::outbound::notifier::Event;
use linepool::testkit::domain::{
    end_ts, entry_confirmed, lock_ts, new_pool, resolved_confirmed, t0,
};
use linepool::testkit::engine::TestEngine;

#[tokio::test]
async fn created_pool_starts_open_with_empty_totals() {
    let t = TestEngine::new();
    let pool = t.engine.create_pool(new_pool(1)).await.unwrap();

    assert_eq!(pool.status, PoolStatus::Open);
    assert!(pool.total_over.is_zero());
    assert!(pool.total_under.is_zero());
    assert!(pool.ai.commit.starts_with("0x"));
    assert_eq!(t.pool(1).await.ai.commit, pool.ai.commit);
}

#[tokio::test]
async fn invalid_timing_is_never_stored() {
    let t = TestEngine::new();
    let mut new = new_pool(1);
    new.lock_ts = new.end_ts;

    let err = t.engine.create_pool(new).await.unwrap_err();
    assert!(matches!(err, Error::Domain(DomainError::InvalidTimestamps)));
    assert!(matches!(
        t.engine.get_pool(PoolId::new(1)).await,
        Err(Error::Settlement(SettlementError::PoolNotFound(_)))
    ));
}

#[tokio::test]
async fn out_of_range_line_is_rejected() {
    let t = TestEngine::new();
    let mut new = new_pool(1);
    new.line_bps = Some(10_001);

    let err = t.engine.create_pool(new).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Domain(DomainError::LineOutOfRange { bps: 10_001 })
    ));
}

#[tokio::test]
async fn duplicate_pool_id_is_a_conflict() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();

    let err = t.engine.create_pool(new_pool(1)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::AlreadyExists(_))
    ));
}

#[tokio::test]
async fn past_lock_time_reads_locked_without_writing() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.clock.set(lock_ts() + Duration::seconds(1));

    let view = t.engine.get_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(view.effective_status, PoolStatus::Locked);
    assert_eq!(view.pool.status, PoolStatus::Open);
    assert_eq!(t.pool(1).await.version, 0);
}

#[tokio::test]
async fn lock_exactly_at_lock_time_is_effective() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.clock.set(lock_ts());

    let view = t.engine.get_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(view.effective_status, PoolStatus::Locked);
}

#[tokio::test]
async fn admin_lock_is_idempotent_and_announced_once() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    let now = t0() + Duration::minutes(10);
    t.clock.set(now);

    let first = t.engine.lock_pool(PoolId::new(1)).await.unwrap();
    let second = t.engine.lock_pool(PoolId::new(1)).await.unwrap();

    assert_eq!(first.pool.status, PoolStatus::Locked);
    assert_eq!(first.pool.locked_at, Some(now));
    assert_eq!(second.pool.version, first.pool.version);
    assert_eq!(
        t.notifications
            .count(|e| matches!(e, Event::PoolLocked { .. })),
        1
    );
}

#[tokio::test]
async fn early_admin_lock_moves_the_lock_instant() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    let now = t0() + Duration::minutes(10);
    t.clock.set(now);
    t.engine.lock_pool(PoolId::new(1)).await.unwrap();

    let reconciler = t.engine.reconciler();
    let late = now + Duration::minutes(1);
    let err = reconciler
        .handle(entry_confirmed(1, "alice", Side::Over, 100_000_000, 750_000, late))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::EntryAfterLock { .. })
    ));
    assert!(t.pool(1).await.total_over.is_zero());
}

#[tokio::test]
async fn halted_pool_refuses_transitions_until_cleared() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    let reconciler = t.engine.reconciler();
    reconciler
        .handle(resolved_confirmed(1, Winner::Over, "0xaa", end_ts()))
        .await
        .unwrap();

    let err = reconciler
        .handle(resolved_confirmed(1, Winner::Under, "0xbb", end_ts()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Integrity(IntegrityError::ConflictingResolution { .. })
    ));
    assert!(t.pool(1).await.is_halted());

    t.clock.set(end_ts());
    let err = t.engine.lock_pool(PoolId::new(1)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::PoolHalted(_))
    ));

    let view = t.engine.clear_halt(PoolId::new(1)).await.unwrap();
    assert!(!view.pool.is_halted());
    assert_eq!(view.pool.winner, Some(Winner::Over));
    assert_eq!(view.pool.proof.unwrap().hash, "0xaa");
}

#[tokio::test]
async fn clearing_an_unhalted_pool_changes_nothing() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();

    let view = t.engine.clear_halt(PoolId::new(1)).await.unwrap();
    assert_eq!(view.pool.version, 0);
}
