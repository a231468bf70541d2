//! The operator as the CLI drives it: configuration text in, engines and
//! summaries out.

mod support;

use std::fs;

use linepool::domain::id::PoolId;
use linepool::domain::pool::PoolStatus;
use linepool::error::{ConfigError, Error};
use linepool::infrastructure::operator::entry::Operator;
use linepool::port::inbound::operator::OperatorPort;
use linepool::testkit::domain::new_pool;
use rust_decimal_macros::dec;
use support::temp::Workspace;

fn config_toml(workspace: &Workspace) -> String {
    fs::read_to_string(workspace.config()).unwrap()
}

#[test]
fn check_config_summarizes_effective_settings() {
    let workspace = Workspace::in_memory();
    let summary = Operator.check_config(&config_toml(&workspace)).unwrap();

    assert_eq!(summary.database, ":memory:");
    assert_eq!(summary.fee_bps, 75);
    assert_eq!(summary.price_sources, vec!["local".to_string()]);
    assert!(summary.warnings.iter().any(|w| w.contains(":memory:")));
}

#[test]
fn empty_config_means_defaults() {
    let summary = Operator.check_config("").unwrap();
    assert_eq!(summary.database, "linepool.db");
    assert_eq!(summary.tick_secs, 15);
}

#[test]
fn malformed_config_is_a_parse_error() {
    let err = Operator.check_config("[policy\nfee_bps = 1").unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
}

#[tokio::test]
async fn pools_are_served_from_the_configured_store() {
    let workspace = Workspace::sqlite();
    let toml = config_toml(&workspace);

    let pools = Operator.pools(&toml).unwrap();
    pools.create_pool(new_pool(7)).await.unwrap();
    pools
        .record_start_price(PoolId::new(7), dec!(0.000021))
        .await
        .unwrap();
    drop(pools);

    let reopened = Operator.pools(&toml).unwrap();
    let view = reopened.get_pool(PoolId::new(7)).await.unwrap();
    assert_eq!(view.pool.symbol, "BONK");
    assert_eq!(view.effective_status, PoolStatus::Locked, "the test timeline is in the past");
    let curve = reopened.prediction_curve(PoolId::new(7)).await;
    assert!(curve.is_ok() || curve.unwrap_err().is_transient());
}

#[tokio::test]
async fn replay_reports_lines_and_parked_events() {
    let workspace = Workspace::in_memory();
    let events = workspace.file(
        "events.jsonl",
        concat!(
            "# exported by the indexer\n",
            "{\"kind\":\"pool_locked_confirmed\",\"pool_id\":9,\"confirmed_at\":\"2026-03-01T12:30:00Z\"}\n",
            "{not json\n",
        ),
    );

    let summary = Operator
        .replay(&config_toml(&workspace), &events.to_string_lossy())
        .await
        .unwrap();

    assert_eq!(summary.lines, Some(3));
    assert_eq!(summary.parked, 1);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.applied, 0);
}

#[tokio::test]
async fn replay_of_missing_file_fails() {
    let workspace = Workspace::in_memory();
    let missing = workspace.dir.path().join("absent.jsonl");

    let err = Operator
        .replay(&config_toml(&workspace), &missing.to_string_lossy())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Ledger(_)));
}
