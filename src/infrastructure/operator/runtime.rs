//! Runtime operator helpers.

use tracing::info;

use crate::adapter::outbound::ledger::jsonl::JsonlLedger;
use crate::error::{ConfigError, Result};
use crate::infrastructure::bootstrap::build_engine;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime;
use crate::port::inbound::operator::{RunRequest, RunSummary};

use super::config;

/// Apply command-line overrides on top of the parsed configuration.
pub(super) fn load_run_config(request: &RunRequest) -> Result<Config> {
    let mut config = config::parse(&request.config_toml)?;
    if let Some(path) = &request.events_path {
        config.ledger.events_path = Some(path.clone());
    }
    if let Some(tick_secs) = request.tick_secs {
        if tick_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "tick_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        config.scheduler.tick_secs = tick_secs;
    }
    Ok(config)
}

pub(super) async fn run(request: RunRequest) -> Result<RunSummary> {
    let config = load_run_config(&request)?;
    runtime::run(config).await
}

pub(super) async fn replay(config_toml: &str, events_path: &str) -> Result<RunSummary> {
    let config = config::parse(config_toml)?;
    let engine = build_engine(&config)?;
    let mut ledger = JsonlLedger::open(events_path).await?;
    let mut summary = runtime::replay(&engine, &mut ledger).await?;
    summary.lines = Some(ledger.line_no());
    info!(
        path = %events_path,
        lines = ledger.line_no(),
        applied = summary.applied,
        rejected = summary.rejected,
        "Replay finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_replace_configured_values() {
        let request = RunRequest {
            config_toml: "[scheduler]\ntick_secs = 30\n".to_string(),
            events_path: Some("events.jsonl".to_string()),
            tick_secs: Some(5),
        };
        let config = load_run_config(&request).unwrap();
        assert_eq!(config.scheduler.tick_secs, 5);
        assert_eq!(config.ledger.events_path.as_deref(), Some("events.jsonl"));
    }

    #[test]
    fn zero_tick_override_is_rejected() {
        let request = RunRequest {
            tick_secs: Some(0),
            ..RunRequest::default()
        };
        assert!(load_run_config(&request).is_err());
    }

    #[tokio::test]
    async fn replay_counts_lines_and_parks_unknown_pools() {
        let dir = tempfile::tempdir().unwrap();
        let events = dir.path().join("events.jsonl");
        std::fs::write(
            &events,
            concat!(
                "# pool 9 is not known locally\n",
                r#"{"kind":"pool_locked_confirmed","pool_id":9,"confirmed_at":"2026-03-01T12:10:00Z"}"#,
                "\n",
            ),
        )
        .unwrap();
        let config_toml = format!(
            "[storage]\ndatabase = \":memory:\"\nproof_dir = \"{}\"\n",
            dir.path().join("proofs").display()
        );

        let summary = replay(&config_toml, events.to_str().unwrap()).await.unwrap();
        assert_eq!(summary.lines, Some(2));
        assert_eq!(summary.parked, 1);
        assert_eq!(summary.applied, 0);
    }
}
