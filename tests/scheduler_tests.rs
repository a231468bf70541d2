//! Scheduler ticks: sampling, locking, resolving, backoff and overdue
//! reporting.

use chrono::Duration;
use linepool::domain::id::PoolId;
use linepool::domain::pool::{PoolStatus, Side, Winner};
use linepool::port::inbound::pools::PoolApi;
use linepool::port::outbound::notifier::Event;
use linepool::port::outbound::store::PoolStore;
use linepool::testkit::domain::{end_ts, entry_confirmed, lock_ts, new_pool, t0};
use linepool::testkit::engine::TestEngine;
use rust_decimal_macros::dec;

#[tokio::test]
async fn tick_samples_live_pools() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.prices.set_price(dec!(0.000021));
    t.clock.set(t0() + Duration::minutes(1));

    let report = t.engine.scheduler().tick().await.unwrap();

    assert_eq!(report.sampled, 1);
    let history = t.store.price_history(PoolId::new(1)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].source, "jupiter");
}

#[tokio::test]
async fn pools_before_start_are_not_sampled() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.prices.set_price(dec!(0.000021));
    t.clock.set(t0() - Duration::minutes(1));

    let report = t.engine.scheduler().tick().await.unwrap();
    assert_eq!(report.sampled, 0);
}

#[tokio::test]
async fn tick_locks_at_the_scheduled_time() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.prices.set_price(dec!(0.000021));
    t.clock.set(lock_ts() + Duration::seconds(20));

    let report = t.engine.scheduler().tick().await.unwrap();

    assert_eq!(report.locked, vec![PoolId::new(1)]);
    let pool = t.pool(1).await;
    assert_eq!(pool.status, PoolStatus::Locked);
    assert_eq!(pool.locked_at, Some(lock_ts()));

    let again = t.engine.scheduler().tick().await.unwrap();
    assert!(again.locked.is_empty());
}

#[tokio::test]
async fn tick_resolves_ended_pools_from_sampled_prices() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    let scheduler = t.engine.scheduler();

    t.prices.set_price(dec!(0.000021));
    t.clock.set(t0());
    scheduler.tick().await.unwrap();

    t.prices.set_price(dec!(0.0000220));
    t.clock.set(end_ts() + Duration::seconds(1));
    let report = scheduler.tick().await.unwrap();

    assert_eq!(report.resolved, vec![PoolId::new(1)]);
    assert!(report.failed.is_empty());
    assert_eq!(t.pool(1).await.winner, Some(Winner::Over));
}

#[tokio::test]
async fn many_pools_resolve_in_one_tick() {
    let t = TestEngine::new();
    for id in 1..=6 {
        t.engine.create_pool(new_pool(id)).await.unwrap();
        t.record_start_price(id, dec!(1.00)).await;
    }
    t.prices.set_price(dec!(1.10));
    t.clock.set(end_ts());

    let mut report = t.engine.scheduler().tick().await.unwrap();
    report.resolved.sort();

    assert_eq!(report.resolved, (1..=6).map(PoolId::new).collect::<Vec<_>>());
}

#[tokio::test]
async fn failed_resolution_backs_off_then_retries() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.record_start_price(1, dec!(0.000021)).await;
    let scheduler = t.engine.scheduler();
    t.clock.set(end_ts() + Duration::seconds(1));

    let report = scheduler.tick().await.unwrap();
    assert_eq!(report.failed, vec![PoolId::new(1)]);
    let failures: Vec<_> = t
        .notifications
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::ResolutionFailed(f) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].attempt, 1);
    assert!((1_000..=1_200).contains(&failures[0].retry_in_ms));

    t.prices.set_price(dec!(0.0000220));
    let waiting = scheduler.tick().await.unwrap();
    assert!(waiting.failed.is_empty() && waiting.resolved.is_empty());
    assert!(!t.pool(1).await.is_terminal());

    t.clock.advance(Duration::seconds(2));
    let retried = scheduler.tick().await.unwrap();
    assert_eq!(retried.resolved, vec![PoolId::new(1)]);
}

#[tokio::test]
async fn unresolved_pool_is_reported_overdue() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.clock.set(end_ts() + Duration::minutes(11));

    let report = t.engine.scheduler().tick().await.unwrap();

    assert_eq!(report.overdue, vec![PoolId::new(1)]);
    assert_eq!(
        t.notifications
            .count(|e| matches!(e, Event::PoolOverdue { overdue_secs, .. } if *overdue_secs == 660)),
        1
    );
}

#[tokio::test]
async fn halted_pools_are_skipped() {
    let t = TestEngine::new();
    for id in 1..=2 {
        t.engine.create_pool(new_pool(id)).await.unwrap();
        t.record_start_price(id, dec!(1.00)).await;
    }
    let reconciler = t.engine.reconciler();
    let at = t0() + Duration::minutes(5);
    reconciler
        .handle(entry_confirmed(1, "alice", Side::Over, 200_000_000, 1_500_000, at))
        .await
        .unwrap();
    let _ = reconciler
        .handle(entry_confirmed(1, "alice", Side::Over, 100_000_000, 750_000, at))
        .await;
    assert!(t.pool(1).await.is_halted());

    t.prices.set_price(dec!(1.10));
    t.clock.set(end_ts());
    let report = t.engine.scheduler().tick().await.unwrap();

    assert_eq!(report.resolved, vec![PoolId::new(2)]);
    assert!(report.locked.iter().all(|id| *id == PoolId::new(2)));
    assert!(report.failed.is_empty());
    assert!(!t.pool(1).await.is_terminal());
}
