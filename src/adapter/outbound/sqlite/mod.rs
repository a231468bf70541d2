//! SQLite persistence adapter.
//!
//! Provides the SQLite-backed pool store using Diesel ORM with embedded
//! migrations.

pub mod database;
pub mod store;
