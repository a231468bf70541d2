//! Ledger-agnostic domain logic.
//!
//! Pure types and functions: no I/O, no clocks. Callers pass the current
//! instant in explicitly.

pub mod curve;
pub mod entry;
pub mod error;
pub mod event;
pub mod id;
pub mod lifecycle;
pub mod money;
pub mod pool;
pub mod price;
pub mod proof;
pub mod resolution;
pub mod settlement;
