//! Ledger-confirmed events replayed against the local projection.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ParticipantId, PoolId};
use super::money::Amount;
use super::pool::{Side, Winner};

/// What the ledger confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    EntryConfirmed {
        pool_id: PoolId,
        participant: ParticipantId,
        side: Side,
        amount: Amount,
        fee: Amount,
        #[serde(default)]
        ledger_ref: Option<String>,
    },
    ClaimConfirmed {
        pool_id: PoolId,
        participant: ParticipantId,
        payout: Amount,
    },
    PoolLockedConfirmed {
        pool_id: PoolId,
    },
    PoolResolvedConfirmed {
        pool_id: PoolId,
        winner: Winner,
        proof_hash: String,
    },
}

impl LedgerEvent {
    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        match self {
            Self::EntryConfirmed { pool_id, .. }
            | Self::ClaimConfirmed { pool_id, .. }
            | Self::PoolLockedConfirmed { pool_id }
            | Self::PoolResolvedConfirmed { pool_id, .. } => *pool_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::EntryConfirmed { .. } => EventKind::Entry,
            Self::ClaimConfirmed { .. } => EventKind::Claim,
            Self::PoolLockedConfirmed { .. } => EventKind::Lock,
            Self::PoolResolvedConfirmed { .. } => EventKind::Resolve,
        }
    }

    /// Deduplication key: participant-scoped for entries and claims,
    /// pool-scoped for lock and resolution.
    #[must_use]
    pub fn idempotency_key(&self) -> IdempotencyKey {
        let participant = match self {
            Self::EntryConfirmed { participant, .. } | Self::ClaimConfirmed { participant, .. } => {
                Some(participant.clone())
            }
            _ => None,
        };
        IdempotencyKey {
            pool_id: self.pool_id(),
            participant,
            kind: self.kind(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Entry,
    Claim,
    Lock,
    Resolve,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Entry => "entry",
            Self::Claim => "claim",
            Self::Lock => "lock",
            Self::Resolve => "resolve",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdempotencyKey {
    pub pool_id: PoolId,
    pub participant: Option<ParticipantId>,
    pub kind: EventKind,
}

/// A ledger event with its confirmation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedEvent {
    #[serde(flatten)]
    pub event: LedgerEvent,
    pub confirmed_at: DateTime<Utc>,
}

impl ConfirmedEvent {
    #[must_use]
    pub fn new(event: LedgerEvent, confirmed_at: DateTime<Utc>) -> Self {
        Self {
            event,
            confirmed_at,
        }
    }

    #[must_use]
    pub fn pool_id(&self) -> PoolId {
        self.event.pool_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_jsonl_line() {
        let line = r#"{"kind":"entry_confirmed","pool_id":7,"participant":"alice","side":"over","amount":5000000000,"fee":37500000,"confirmed_at":"2026-03-01T12:05:00Z"}"#;
        let event: ConfirmedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(event.pool_id(), PoolId::new(7));
        assert!(matches!(
            event.event,
            LedgerEvent::EntryConfirmed {
                side: Side::Over,
                ledger_ref: None,
                ..
            }
        ));
    }

    #[test]
    fn resolved_event_roundtrips_winner() {
        let line = r#"{"kind":"pool_resolved_confirmed","pool_id":7,"winner":"void","proof_hash":"0xab","confirmed_at":"2026-03-01T13:00:00Z"}"#;
        let event: ConfirmedEvent = serde_json::from_str(line).unwrap();
        assert_eq!(
            event.event,
            LedgerEvent::PoolResolvedConfirmed {
                pool_id: PoolId::new(7),
                winner: Winner::Void,
                proof_hash: "0xab".into(),
            }
        );
    }

    #[test]
    fn idempotency_keys_scope_by_kind() {
        let entry = LedgerEvent::EntryConfirmed {
            pool_id: PoolId::new(1),
            participant: ParticipantId::new("a"),
            side: Side::Over,
            amount: Amount::new(10),
            fee: Amount::new(0),
            ledger_ref: None,
        };
        let claim = LedgerEvent::ClaimConfirmed {
            pool_id: PoolId::new(1),
            participant: ParticipantId::new("a"),
            payout: Amount::new(10),
        };
        assert_ne!(entry.idempotency_key(), claim.idempotency_key());
        assert_eq!(
            LedgerEvent::PoolLockedConfirmed {
                pool_id: PoolId::new(1)
            }
            .idempotency_key()
            .participant,
            None
        );
    }
}
