//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`] - [`ManualClock`](clock::ManualClock), a settable time source.
//! - [`price`] - [`ScriptedPriceOracle`](price::ScriptedPriceOracle) with
//!   scripted prices, failures and latency.
//! - [`proof`] - [`MemoryProofStore`](proof::MemoryProofStore) with upload
//!   failures and tampering.
//! - [`domain`] - Builders for pools, entries and ledger events.
//! - [`config`] - Canonical fast settings for tests.
//! - [`engine`] - A fully wired engine over in-memory adapters.

pub mod clock;
pub mod config;
pub mod domain;
pub mod engine;
pub mod price;
pub mod proof;
