//! Price source adapters.

pub mod fallback;
pub mod http;
