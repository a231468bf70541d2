//! Resolution oracle: measurement, proof publication, staged retries and
//! proof verification.

use std::time::Duration as StdDuration;

use chrono::Duration;
use linepool::domain::id::PoolId;
use linepool::domain::pool::{PoolStatus, Winner};
use linepool::error::{Error, SettlementError};
use linepool::port::inbound::pools::PoolApi;
use linepool::port::outbound::notifier::Event;
use linepool::port::outbound::store::PoolStore;
use linepool::testkit::domain::{end_ts, new_pool, staged};
use linepool::testkit::engine::TestEngine;
use rust_decimal_macros::dec;

async fn ended_pool(line_bps: Option<i64>) -> TestEngine {
    let t = TestEngine::new();
    let mut new = new_pool(1);
    new.line_bps = line_bps;
    t.engine.create_pool(new).await.unwrap();
    t.record_start_price(1, dec!(0.000021)).await;
    t.clock.set(end_ts() + Duration::seconds(5));
    t
}

#[tokio::test]
async fn change_above_line_resolves_over() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();

    assert_eq!(settled.winner, Winner::Over);
    assert!(settled.changed);
    assert!(settled.proof.hash.starts_with("0x"));
    assert_eq!(
        settled.proof.url.as_deref(),
        Some(format!("mem://{}", settled.proof.hash).as_str())
    );

    let pool = t.pool(1).await;
    assert_eq!(pool.status, PoolStatus::Resolved);
    assert_eq!(pool.winner, Some(Winner::Over));
    assert_eq!(
        t.notifications
            .count(|e| matches!(e, Event::PoolSettled(s) if s.winner == Winner::Over)),
        1
    );
}

#[tokio::test]
async fn change_below_line_resolves_under() {
    let t = ended_pool(Some(500)).await;
    t.prices.set_price(dec!(0.0000220));

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(settled.winner, Winner::Under);
}

#[tokio::test]
async fn negative_line_compares_signed_change() {
    let t = ended_pool(Some(-200)).await;
    // -476 bps
    t.prices.set_price(dec!(0.0000200));

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(settled.winner, Winner::Under);
}

#[tokio::test]
async fn absent_line_is_a_plain_up_or_down_pool() {
    let t = ended_pool(None).await;
    t.prices.set_price(dec!(0.0000211));

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(settled.winner, Winner::Over);
}

#[tokio::test]
async fn change_landing_on_the_line_is_void() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.record_start_price(1, dec!(1.00)).await;
    t.prices.set_price(dec!(1.03));
    t.clock.set(end_ts());

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();

    assert_eq!(settled.winner, Winner::Void);
    let pool = t.pool(1).await;
    assert_eq!(pool.status, PoolStatus::Void);
    assert!(pool.void_reason.unwrap().contains("300bps"));
}

#[tokio::test]
async fn resolving_before_end_is_rejected() {
    let t = ended_pool(Some(300)).await;
    t.clock.set(end_ts() - Duration::seconds(1));
    t.prices.set_price(dec!(0.0000220));

    let err = t.engine.resolve_pool(PoolId::new(1)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::PoolNotEnded(_))
    ));
    assert_eq!(t.prices.calls(), 0);
}

#[tokio::test]
async fn second_resolution_is_a_no_op() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));

    let first = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    t.prices.set_price(dec!(0.0000100));
    let second = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();

    assert!(!second.changed);
    assert_eq!(second.winner, first.winner);
    assert_eq!(second.proof, first.proof);
    assert_eq!(t.prices.calls(), 1);
}

#[tokio::test]
async fn price_failure_leaves_the_pool_unsettled() {
    let t = ended_pool(Some(300)).await;

    let err = t.engine.resolve_pool(PoolId::new(1)).await.unwrap_err();

    assert!(err.is_transient(), "unexpected error: {err}");
    let pool = t.pool(1).await;
    assert!(!pool.is_terminal());
    assert!(pool.proof.is_none());
    assert!(t.proofs.is_empty());
}

#[tokio::test]
async fn missing_start_price_defers_resolution() {
    let t = TestEngine::new();
    t.engine.create_pool(new_pool(1)).await.unwrap();
    t.prices.set_price(dec!(0.0000220));
    t.clock.set(end_ts());

    let err = t.engine.resolve_pool(PoolId::new(1)).await.unwrap_err();
    assert!(matches!(err, Error::PriceUnavailable { .. }));
    assert!(!t.pool(1).await.is_terminal());
}

#[tokio::test]
async fn slow_price_source_times_out() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    t.prices.set_delay(StdDuration::from_millis(600));

    let err = t.engine.resolve_pool(PoolId::new(1)).await.unwrap_err();

    assert!(matches!(err, Error::Timeout { .. }), "unexpected error: {err}");
    assert!(err.is_transient());
    assert!(!t.pool(1).await.is_terminal());
}

#[tokio::test]
async fn failed_upload_is_retried_from_scratch() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    t.proofs.fail_puts(1);

    let err = t.engine.resolve_pool(PoolId::new(1)).await.unwrap_err();
    assert!(matches!(err, Error::ProofStore(_)));
    assert!(t
        .store
        .staged_resolutions(PoolId::new(1))
        .await
        .unwrap()
        .is_empty());

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    assert_eq!(settled.winner, Winner::Over);
    assert_eq!(t.proofs.puts(), 1);
}

#[tokio::test]
async fn staged_resolution_is_applied_without_remeasuring() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    t.store.stage_resolution(&staged(1, "0xfeed")).await.unwrap();

    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();

    assert_eq!(settled.proof.hash, "0xfeed");
    assert_eq!(settled.winner, Winner::Void);
    assert_eq!(t.prices.calls(), 0, "the staged outcome is final");
    assert_eq!(t.proofs.puts(), 0);
}

#[tokio::test]
async fn published_proof_verifies() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    t.engine.resolve_pool(PoolId::new(1)).await.unwrap();

    let check = t.engine.verify_proof(PoolId::new(1)).await.unwrap();

    assert!(check.valid);
    assert_eq!(check.expected_hash, check.actual_hash);
}

#[tokio::test]
async fn tampered_proof_fails_verification() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    let settled = t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    let url = settled.proof.url.unwrap();
    t.proofs.tamper(&url, br#"{"winner":"under"}"#);

    let check = t.engine.verify_proof(PoolId::new(1)).await.unwrap();

    assert!(!check.valid);
    assert_ne!(check.expected_hash, check.actual_hash);
}

#[tokio::test]
async fn verifying_an_open_pool_is_rejected() {
    let t = ended_pool(Some(300)).await;

    let err = t.engine.verify_proof(PoolId::new(1)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::PoolNotResolved(_))
    ));
}

#[tokio::test]
async fn void_is_idempotent_but_cannot_override_a_winner() {
    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));

    let voided = t.engine.void_pool(PoolId::new(1), "feed outage").await.unwrap();
    let again = t.engine.void_pool(PoolId::new(1), "feed outage").await.unwrap();
    assert!(voided.changed);
    assert!(!again.changed);
    assert_eq!(again.proof, voided.proof);
    assert_eq!(t.pool(1).await.void_reason.as_deref(), Some("feed outage"));

    let t = ended_pool(Some(300)).await;
    t.prices.set_price(dec!(0.0000220));
    t.engine.resolve_pool(PoolId::new(1)).await.unwrap();
    let err = t.engine.void_pool(PoolId::new(1), "late").await.unwrap_err();
    assert!(matches!(
        err,
        Error::Settlement(SettlementError::PoolNotOpen { .. })
    ));
}

#[tokio::test]
async fn void_reuses_a_staged_void_proof() {
    let t = ended_pool(Some(300)).await;
    t.store.stage_resolution(&staged(1, "0xfeed")).await.unwrap();

    let voided = t.engine.void_pool(PoolId::new(1), "feed outage").await.unwrap();

    assert!(voided.changed);
    assert_eq!(voided.proof.hash, "0xfeed");
    assert_eq!(voided.proof.url.as_deref(), Some("mem://0xfeed"));
    assert_eq!(t.proofs.puts(), 0);
}
