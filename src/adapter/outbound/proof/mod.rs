//! Proof storage adapters.

pub mod fs;
