//! Application services (use cases).
//!
//! These services orchestrate domain logic and coordinate adapters
//! to implement the application's use cases.

pub mod engine;
pub mod guard;
pub mod lifecycle;
pub mod reconciler;
pub mod resolution;
pub mod retry;
pub mod scheduler;
pub mod settlement;
pub mod state;
