//! Inbound (driving) ports consumed by inbound adapters.
//!
//! - [`pools`]: pool lifecycle, entry, claim and proof use cases
//! - [`operator`]: configuration, wiring and the runtime loop

pub mod operator;
pub mod pools;
