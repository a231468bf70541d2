use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::id::{PoolId, ParticipantId};
use crate::domain::pool::Winner;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Settlement-surface rejections.
///
/// These are specific so client layers can render precise messages. The
/// pool and entry are left unchanged when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("pool {0} not found")]
    PoolNotFound(PoolId),

    #[error("pool {0} already exists")]
    AlreadyExists(PoolId),

    #[error("pool {0} is locked, no more entries allowed")]
    PoolLocked(PoolId),

    #[error("pool {pool_id} is {status}, not open")]
    PoolNotOpen { pool_id: PoolId, status: String },

    #[error("pool {0} has not reached its end time")]
    PoolNotEnded(PoolId),

    #[error("pool {0} is not resolved yet")]
    PoolNotResolved(PoolId),

    #[error("no entry for {participant} in pool {pool_id}")]
    EntryNotFound {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("winnings for {participant} in pool {pool_id} already claimed")]
    AlreadyClaimed {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("{participant} did not win pool {pool_id}")]
    NotWinner {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("{participant} already holds the other side in pool {pool_id}")]
    SideMismatch {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("entry confirmed at {confirmed_at} is at or after the lock instant {lock_instant} of pool {pool_id}")]
    EntryAfterLock {
        pool_id: PoolId,
        confirmed_at: chrono::DateTime<chrono::Utc>,
        lock_instant: chrono::DateTime<chrono::Utc>,
    },

    #[error("pool {0} is halted pending manual review")]
    PoolHalted(PoolId),
}

/// Contradictions with already-committed data.
///
/// Processing for the affected pool halts; these are never resolved by
/// overwriting stored state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("pool {pool_id} already settled as {stored:?} (proof {stored_hash}), refusing {attempted:?} (proof {attempted_hash})")]
    ConflictingResolution {
        pool_id: PoolId,
        stored: Winner,
        stored_hash: String,
        attempted: Winner,
        attempted_hash: String,
    },

    #[error("entry for {participant} confirmed after pool {pool_id} was settled")]
    EntryAfterResolution {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("entry for {participant} in pool {pool_id} would shrink its net stake")]
    ShrinkingEntry {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("pool {pool_id} no longer matches its AI commitment")]
    CommitmentMismatch { pool_id: PoolId },

    #[error("ledger confirmed a claim by {participant}, who lost pool {pool_id}")]
    ClaimByLoser {
        pool_id: PoolId,
        participant: ParticipantId,
    },

    #[error("stored proof for pool {pool_id} does not match its hash")]
    ProofMismatch { pool_id: PoolId },
}

/// Coarse classification used to decide between retrying, rejecting and
/// halting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad input, rejected synchronously, never stored.
    Validation,
    /// Rejected, surfaced to the caller, state unchanged.
    Conflict,
    /// Retry later with backoff.
    Transient,
    /// Halt the pool and escalate.
    Integrity,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Settlement(#[from] SettlementError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("price unavailable for {asset}: {reason}")]
    PriceUnavailable { asset: String, reason: String },

    #[error("proof store error: {0}")]
    ProofStore(String),

    #[error("ledger error: {0}")]
    Ledger(String),

    #[error("{operation} timed out after {millis}ms")]
    Timeout { operation: &'static str, millis: u64 },

    #[error("concurrent update of pool {0}, retry")]
    StaleWrite(PoolId),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Classify this error for retry/halt decisions.
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_) | Self::Domain(_) | Self::Parse(_) | Self::Url(_) => {
                ErrorClass::Validation
            }
            Self::Settlement(_) => ErrorClass::Conflict,
            Self::Integrity(_) => ErrorClass::Integrity,
            Self::PriceUnavailable { .. }
            | Self::ProofStore(_)
            | Self::Ledger(_)
            | Self::Timeout { .. }
            | Self::StaleWrite(_)
            | Self::Http(_)
            | Self::Io(_)
            | Self::Connection(_)
            | Self::Database(_)
            | Self::Json(_) => ErrorClass::Transient,
        }
    }

    /// True when the failed operation may succeed if retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// True when processing for the affected pool must halt.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        self.class() == ErrorClass::Integrity
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Self {
        Error::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settlement_errors_are_conflicts() {
        let err: Error = SettlementError::AlreadyClaimed {
            pool_id: PoolId::new(1),
            participant: ParticipantId::new("alice"),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Conflict);
        assert!(!err.is_transient());
    }

    #[test]
    fn price_failures_are_transient() {
        let err = Error::PriceUnavailable {
            asset: "BONK".into(),
            reason: "all sources failed".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn conflicting_resolution_is_integrity() {
        let err: Error = IntegrityError::ConflictingResolution {
            pool_id: PoolId::new(7),
            stored: Winner::Over,
            stored_hash: "0xaa".into(),
            attempted: Winner::Under,
            attempted_hash: "0xbb".into(),
        }
        .into();
        assert!(err.is_integrity());
        assert!(err.to_string().contains("pool 7"));
    }

    #[test]
    fn domain_errors_are_validation() {
        let err: Error = DomainError::InvalidTimestamps.into();
        assert_eq!(err.class(), ErrorClass::Validation);
    }
}
