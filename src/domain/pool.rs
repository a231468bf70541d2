//! Pool aggregate: timing, line, stake totals and settlement outcome.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::id::{AssetId, PoolId};
use super::money::{Amount, Bps};
use super::proof::ai_commit;

/// The side a participant stakes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
}

impl Side {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Over => "over",
            Self::Under => "under",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "over" => Ok(Self::Over),
            "under" => Ok(Self::Under),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// Settlement outcome of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Over,
    Under,
    /// Everyone is refunded their gross stake.
    Void,
}

impl Winner {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Over => "over",
            Self::Under => "under",
            Self::Void => "void",
        }
    }

    /// The winning side, if the outcome has one.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::Over => Some(Side::Over),
            Self::Under => Some(Side::Under),
            Self::Void => None,
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Over => Self::Over,
            Side::Under => Self::Under,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Winner {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "over" => Ok(Self::Over),
            "under" => Ok(Self::Under),
            "void" => Ok(Self::Void),
            other => Err(format!("unknown winner '{other}'")),
        }
    }
}

/// Stored lifecycle status of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolStatus {
    Open,
    Locked,
    Resolved,
    Void,
}

impl PoolStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Locked => "locked",
            Self::Resolved => "resolved",
            Self::Void => "void",
        }
    }

    /// Resolved and Void are terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Resolved | Self::Void)
    }
}

impl fmt::Display for PoolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoolStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "locked" => Ok(Self::Locked),
            "resolved" => Ok(Self::Resolved),
            "void" => Ok(Self::Void),
            other => Err(format!("unknown pool status '{other}'")),
        }
    }
}

/// Reference to a published resolution proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRef {
    /// `0x`-prefixed SHA-256 of the canonical proof bytes.
    pub hash: String,
    /// Where the proof can be fetched. Absent when the resolution was learned
    /// from the ledger before the proof location was known.
    pub url: Option<String>,
}

impl ProofRef {
    pub fn new(hash: impl Into<String>, url: Option<String>) -> Self {
        Self {
            hash: hash.into(),
            url,
        }
    }
}

/// Declared prediction parameters fixed at pool creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiCommitment {
    /// Model that produced the line.
    pub model: String,
    /// Model confidence in basis points.
    pub confidence: Bps,
    /// Hash over line, confidence, model and timing.
    pub commit: String,
}

/// Parameters for creating a pool.
#[derive(Debug, Clone)]
pub struct NewPool {
    pub id: PoolId,
    pub asset: AssetId,
    pub symbol: String,
    pub start_ts: DateTime<Utc>,
    pub lock_ts: DateTime<Utc>,
    pub end_ts: DateTime<Utc>,
    pub line_bps: Option<i64>,
    pub model: String,
    pub confidence_bps: i64,
}

/// A prediction pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Ledger pool id.
    pub id: PoolId,
    /// Asset priced by the oracle.
    pub asset: AssetId,
    /// Display ticker.
    pub symbol: String,
    /// Window start; the earliest price sample is the start price.
    pub start_ts: DateTime<Utc>,
    /// Scheduled lock time; no entries at or after the lock instant.
    pub lock_ts: DateTime<Utc>,
    /// Resolution becomes possible at this time.
    pub end_ts: DateTime<Utc>,
    /// Target change in basis points; `None` for market-line pools.
    pub line_bps: Option<Bps>,
    /// Net stake on Over.
    pub total_over: Amount,
    /// Net stake on Under.
    pub total_under: Amount,
    /// Stored status; see [`Pool::effective_status`].
    pub status: PoolStatus,
    /// When the lock was applied, if it was.
    pub locked_at: Option<DateTime<Utc>>,
    /// Outcome, set once on settlement.
    pub winner: Option<Winner>,
    /// Published proof, set once on settlement.
    pub proof: Option<ProofRef>,
    /// Model parameters fixed at creation and their commitment.
    pub ai: AiCommitment,
    /// Why the pool was voided.
    pub void_reason: Option<String>,
    /// Set when processing halted on an integrity violation.
    pub halted: Option<String>,
    /// Compare-and-swap counter bumped by every stored write.
    pub version: u64,
}

impl Pool {
    /// Validate creation parameters and build an open pool.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when timing is not strictly ordered or the
    /// line or confidence is out of range.
    pub fn create(new: NewPool) -> Result<Self, DomainError> {
        if !(new.start_ts < new.lock_ts && new.lock_ts < new.end_ts) {
            return Err(DomainError::InvalidTimestamps);
        }
        let line_bps = new.line_bps.map(Bps::try_line).transpose()?;
        let confidence = Bps::try_confidence(new.confidence_bps)?;
        let commit = ai_commit(
            line_bps,
            confidence,
            &new.model,
            new.start_ts,
            new.lock_ts,
            new.end_ts,
        );

        Ok(Self {
            id: new.id,
            asset: new.asset,
            symbol: new.symbol,
            start_ts: new.start_ts,
            lock_ts: new.lock_ts,
            end_ts: new.end_ts,
            line_bps,
            total_over: Amount::ZERO,
            total_under: Amount::ZERO,
            status: PoolStatus::Open,
            locked_at: None,
            winner: None,
            proof: None,
            ai: AiCommitment {
                model: new.model,
                confidence,
                commit,
            },
            void_reason: None,
            halted: None,
            version: 0,
        })
    }

    /// Status as observed at `now`.
    ///
    /// A stored Open pool past its lock time reports Locked; storage is not
    /// touched.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> PoolStatus {
        match self.status {
            PoolStatus::Open if now >= self.lock_ts => PoolStatus::Locked,
            status => status,
        }
    }

    /// Earliest of the scheduled lock time and the applied lock time.
    #[must_use]
    pub fn lock_instant(&self) -> DateTime<Utc> {
        match self.locked_at {
            Some(at) if at < self.lock_ts => at,
            _ => self.lock_ts,
        }
    }

    /// Target line; an absent line is a pure up/down pool.
    #[must_use]
    pub fn line(&self) -> Bps {
        self.line_bps.unwrap_or(Bps::ZERO)
    }

    #[must_use]
    pub fn total_for(&self, side: Side) -> Amount {
        match side {
            Side::Over => self.total_over,
            Side::Under => self.total_under,
        }
    }

    /// Combined net stake of both sides.
    pub fn total(&self) -> Result<Amount, DomainError> {
        self.total_over.checked_add(self.total_under)
    }

    /// Credit net stake to one side.
    pub fn credit(&mut self, side: Side, net: Amount) -> Result<(), DomainError> {
        match side {
            Side::Over => self.total_over = self.total_over.checked_add(net)?,
            Side::Under => self.total_under = self.total_under.checked_add(net)?,
        }
        Ok(())
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Combined stake as an ordering key; never overflows.
    #[must_use]
    pub fn volume(&self) -> u128 {
        u128::from(self.total_over.units()) + u128::from(self.total_under.units())
    }

    /// Recompute the commitment from the stored line, confidence, model and
    /// timing.
    #[must_use]
    pub fn expected_commit(&self) -> String {
        ai_commit(
            self.line_bps,
            self.ai.confidence,
            &self.ai.model,
            self.start_ts,
            self.lock_ts,
            self.end_ts,
        )
    }

    /// False when the declared prediction was altered after creation.
    #[must_use]
    pub fn commitment_intact(&self) -> bool {
        self.expected_commit().eq_ignore_ascii_case(&self.ai.commit)
    }
}
