//! Infrastructure configuration modules.

pub mod curve;
pub mod ledger;
pub mod logging;
pub mod policy;
pub mod price;
pub mod scheduler;
pub mod settings;
pub mod storage;
