//! Domain validation errors for core domain types.
//!
//! This module defines errors that occur when domain invariants are violated.
//! These errors are returned by `try_new` constructors and by the pure
//! settlement and resolution functions.
//!
//! # Examples
//!
//! Handling validation errors:
//!
//! ```
//! use linepool::domain::error::DomainError;
//! use linepool::domain::money::Bps;
//!
//! let result = Bps::try_line(12_000);
//! assert!(matches!(result, Err(DomainError::LineOutOfRange { .. })));
//! ```

use thiserror::Error;

/// Errors that occur when domain invariants are violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Pool timing must satisfy `start < lock < end`.
    #[error("timestamps must satisfy start < lock < end")]
    InvalidTimestamps,

    /// Target lines are bounded to plus or minus 100%.
    #[error("line {bps} bps is outside [-10000, 10000]")]
    LineOutOfRange {
        /// The rejected line.
        bps: i64,
    },

    /// Confidence is a ratio in `[0, 10000]` basis points.
    #[error("confidence {bps} bps is outside [0, 10000]")]
    ConfidenceOutOfRange {
        /// The rejected confidence.
        bps: i64,
    },

    /// Entries and fees work on strictly positive amounts.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// The fee can never consume the whole stake.
    #[error("fee {fee} exceeds amount {amount}")]
    FeeExceedsAmount {
        /// Gross amount.
        amount: u64,
        /// Fee charged on it.
        fee: u64,
    },

    /// Entries below the configured floor are rejected.
    #[error("amount {amount} is below the minimum entry {minimum}")]
    BelowMinimumEntry {
        /// Gross amount offered.
        amount: u64,
        /// Configured floor.
        minimum: u64,
    },

    /// A resolution needs a non-zero reference price.
    #[error("start price is zero, cannot compute price change")]
    ZeroStartPrice,

    /// Prices must be strictly positive.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Integer settlement arithmetic left the representable range.
    #[error("arithmetic overflow in {0}")]
    ArithmeticOverflow(&'static str),

    /// A prediction curve needs at least one segment.
    #[error("curve needs at least 1 point, got {0}")]
    InvalidCurvePoints(usize),
}
