//! In-memory pool store.

pub mod store;
