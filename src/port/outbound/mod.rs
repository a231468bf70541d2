//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe infrastructure dependencies such as price
//! sources, proof storage, the ledger, persistence and notifications.

pub mod clock;
pub mod ledger;
pub mod notifier;
pub mod price;
pub mod proof;
pub mod store;
