//! Outbound adapters (driven side).

pub mod ledger;
pub mod memory;
pub mod price;
pub mod proof;
pub mod sqlite;
