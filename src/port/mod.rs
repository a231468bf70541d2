//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!     CLI / runtime ─┤  PoolApi (inbound)      │
//!                    │  Application services   │
//!                    └────────────┬────────────┘
//!       ┌──────────┬──────────────┼─────────────┬──────────┐
//!       ▼          ▼              ▼             ▼          ▼
//!  PriceOracle ProofStore     PoolStore       Ledger    Notifier
//! ```

pub mod inbound;
pub mod outbound;
