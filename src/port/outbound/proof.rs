//! Proof publication port.

use async_trait::async_trait;

use crate::error::Result;

/// Durable, publicly fetchable storage for resolution proofs.
///
/// Blobs are content-addressed, so putting the same bytes twice yields the
/// same location and an abandoned upload leaves nothing but a valid blob.
#[async_trait]
pub trait ProofStore: Send + Sync {
    /// Store `bytes` and return the location they can be fetched from.
    async fn put(&self, bytes: &[u8]) -> Result<String>;

    /// Fetch the bytes stored at `url`.
    async fn get(&self, url: &str) -> Result<Vec<u8>>;
}
