//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`bootstrap`] - Composition root for runtime wiring
//! - [`config`] - Configuration loading and validation
//! - [`operator`] - The operator port behind the CLI
//! - [`runtime`] - Scheduler and ledger event loop

pub mod bootstrap;
pub mod config;
pub mod operator;
pub mod runtime;
