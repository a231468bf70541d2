//! Notifier port for lifecycle notifications and escalations.
//!
//! This module defines the trait for sending notifications about
//! pool transitions, resolution failures and integrity violations.

use chrono::{DateTime, Utc};

use crate::domain::event::EventKind;
use crate::domain::id::PoolId;
use crate::domain::pool::Winner;

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// Pool stopped accepting entries.
    PoolLocked {
        pool_id: PoolId,
        at: DateTime<Utc>,
    },
    /// Pool settled.
    PoolSettled(SettledEvent),
    /// A resolution attempt failed and will be retried.
    ResolutionFailed(FailureEvent),
    /// A locked pool is past its end time plus grace.
    PoolOverdue {
        pool_id: PoolId,
        end_ts: DateTime<Utc>,
        overdue_secs: i64,
    },
    /// Processing for a pool halted; manual review required.
    IntegrityViolation {
        pool_id: PoolId,
        detail: String,
    },
    /// A ledger event was dropped from the parked buffer.
    EventDropped {
        pool_id: PoolId,
        kind: EventKind,
        reason: String,
    },
}

/// Settlement event.
#[derive(Debug, Clone)]
pub struct SettledEvent {
    pub pool_id: PoolId,
    pub winner: Winner,
    pub proof_hash: String,
    pub proof_url: Option<String>,
}

/// Resolution failure event.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub pool_id: PoolId,
    pub attempt: u32,
    pub error: String,
    pub retry_in_ms: u64,
}

/// Trait for notification handlers.
///
/// Implementations must be thread-safe (`Send + Sync`) and should return
/// quickly; spawn a task for slow I/O.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for tests or when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// Notifier that writes every event to the tracing log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{error, info, warn};
        match event {
            Event::PoolLocked { pool_id, at } => {
                info!(pool_id = %pool_id, at = %at, "Pool locked");
            }
            Event::PoolSettled(e) => {
                info!(
                    pool_id = %e.pool_id,
                    winner = %e.winner,
                    proof_hash = %e.proof_hash,
                    proof_url = e.proof_url.as_deref().unwrap_or("-"),
                    "Pool settled"
                );
            }
            Event::ResolutionFailed(e) => {
                warn!(
                    pool_id = %e.pool_id,
                    attempt = e.attempt,
                    retry_in_ms = e.retry_in_ms,
                    error = %e.error,
                    "Resolution failed"
                );
            }
            Event::PoolOverdue {
                pool_id,
                end_ts,
                overdue_secs,
            } => {
                warn!(pool_id = %pool_id, end_ts = %end_ts, overdue_secs, "Pool overdue for resolution");
            }
            Event::IntegrityViolation { pool_id, detail } => {
                error!(pool_id = %pool_id, detail = %detail, "Integrity violation, pool halted");
            }
            Event::EventDropped {
                pool_id,
                kind,
                reason,
            } => {
                error!(pool_id = %pool_id, kind = %kind, reason = %reason, "Ledger event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    impl Notifier for Counting {
        fn notify(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registry_broadcasts_to_every_notifier() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(NullNotifier));
        registry.register(Box::new(LogNotifier));

        registry.notify_all(Event::IntegrityViolation {
            pool_id: PoolId::new(1),
            detail: "conflict".into(),
        });

        assert_eq!(registry.len(), 4);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
