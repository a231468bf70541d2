//! Linepool - over/under price-line prediction pools.
//!
//! A pool asks whether an asset's price will finish above or below a line
//! expressed in basis points of its start price. Participants stake on a
//! side through an external ledger; the engine tracks the pool lifecycle,
//! measures the outcome, publishes a hashed resolution proof and computes
//! pari-mutuel payouts.
//!
//! # Architecture
//!
//! - [`domain`] - Pure types and rules: pools, entries, settlement math,
//!   resolution proofs and the prediction curve
//! - [`port`] - Traits at the edges: [`port::inbound::pools::PoolApi`] for
//!   drivers, price/proof/store/ledger/notifier for adapters
//! - [`application`] - Use cases: lifecycle, settlement, resolution, the
//!   ledger reconciler and the scheduler
//! - [`adapter`] - CLI, SQLite and in-memory stores, HTTP price sources,
//!   file proof store and ledger sources
//! - [`infrastructure`] - Configuration, wiring and the runtime loop
//!
//! # Features
//!
//! - `testkit` - Export [`testkit`] helpers for integration tests

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
