//! Ledger event sources.

pub mod channel;
pub mod jsonl;
