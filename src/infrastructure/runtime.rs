//! Runtime loop: scheduler ticks and ledger events until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::adapter::outbound::ledger::jsonl::JsonlLedger;
use crate::application::engine::Engine;
use crate::application::reconciler::{Outcome, ReconcileReport};
use crate::domain::event::ConfirmedEvent;
use crate::error::{Error, Result};
use crate::infrastructure::bootstrap::build_engine;
use crate::infrastructure::config::settings::Config;
use crate::port::inbound::operator::RunSummary;
use crate::port::outbound::ledger::Ledger;

fn summarize(ticks: u64, report: ReconcileReport, parked: usize) -> RunSummary {
    RunSummary {
        ticks,
        applied: report.applied,
        duplicates: report.duplicates,
        rejected: report.rejected,
        parked,
        lines: None,
    }
}

/// Run with configuration-driven adapters until Ctrl-C.
pub async fn run(config: Config) -> Result<RunSummary> {
    let engine = Arc::new(build_engine(&config)?);
    let ledger: Option<Box<dyn Ledger>> = match &config.ledger.events_path {
        Some(path) => Some(Box::new(JsonlLedger::open(path).await?)),
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    run_with_shutdown(engine, ledger, config.scheduler.tick_interval(), shutdown_rx).await
}

async fn next_ledger_event(ledger: &mut Option<Box<dyn Ledger>>) -> Result<Option<ConfirmedEvent>> {
    match ledger.as_mut() {
        Some(source) => source.next_event().await,
        None => std::future::pending().await,
    }
}

/// Runtime loop with an externally controlled shutdown signal.
pub async fn run_with_shutdown(
    engine: Arc<Engine>,
    mut ledger: Option<Box<dyn Ledger>>,
    tick: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<RunSummary> {
    let scheduler = engine.scheduler();
    let reconciler = engine.reconciler();
    let mut ticks = 0u64;
    let mut report = ReconcileReport::default();

    info!(
        tick_secs = tick.as_secs(),
        ledger = ledger.as_ref().map_or("none", |l| l.name()),
        "Starting linepool"
    );

    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            result = shutdown.changed() => {
                match result {
                    Ok(()) => {
                        if *shutdown.borrow() {
                            info!("Shutdown signal received");
                            break;
                        }
                    }
                    Err(_) => {
                        info!("Shutdown channel closed");
                        break;
                    }
                }
            }
            _ = interval.tick() => {
                ticks += 1;
                if let Err(e) = scheduler.tick().await {
                    warn!(error = %e, "Scheduler tick failed");
                }
                reconciler.retry_parked(None).await;
            }
            event = next_ledger_event(&mut ledger) => {
                match event {
                    Ok(Some(event)) => {
                        let outcome = reconciler.handle(event).await;
                        log_rejection(&outcome);
                        report.record(&outcome);
                    }
                    Ok(None) => {
                        info!("Ledger source exhausted");
                        ledger = None;
                    }
                    Err(e @ Error::Parse(_)) => {
                        warn!(error = %e, "Skipping malformed ledger line");
                        report.rejected += 1;
                    }
                    Err(e) => {
                        error!(error = %e, "Ledger read failed, detaching ledger");
                        ledger = None;
                    }
                }
            }
        }
    }

    let summary = summarize(ticks, report, reconciler.parked_len());
    info!(
        ticks = summary.ticks,
        applied = summary.applied,
        rejected = summary.rejected,
        parked = summary.parked,
        "linepool stopped"
    );
    Ok(summary)
}

fn log_rejection(outcome: &Result<Outcome>) {
    match outcome {
        Err(e) if e.is_integrity() => error!(error = %e, "Ledger event violates committed state"),
        Err(e) => warn!(error = %e, "Ledger event rejected"),
        Ok(_) => {}
    }
}

/// Apply every event of `ledger`, then retry whatever was parked.
///
/// Unparseable lines are counted as rejected and skipped.
pub async fn replay(engine: &Engine, ledger: &mut dyn Ledger) -> Result<RunSummary> {
    let reconciler = engine.reconciler();
    let mut report = ReconcileReport::default();

    loop {
        match ledger.next_event().await {
            Ok(Some(event)) => {
                let outcome = reconciler.handle(event).await;
                log_rejection(&outcome);
                report.record(&outcome);
            }
            Ok(None) => break,
            Err(e @ Error::Parse(_)) => {
                warn!(error = %e, "Skipping malformed ledger line");
                report.rejected += 1;
            }
            Err(e) => return Err(e),
        }
    }

    report.applied += reconciler.retry_parked(None).await;
    Ok(summarize(0, report, reconciler.parked_len()))
}
