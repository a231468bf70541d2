//! In-memory [`ProofStore`] with fault injection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::proof::hash_bytes;
use crate::error::{Error, Result};
use crate::port::outbound::proof::ProofStore;

/// Content-addressed blobs under `mem://<hash>` URLs.
#[derive(Default)]
pub struct MemoryProofStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    failing_puts: AtomicU32,
    failing_gets: AtomicU32,
    puts: AtomicU32,
}

impl MemoryProofStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` uploads.
    pub fn fail_puts(&self, n: u32) {
        self.failing_puts.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` fetches.
    pub fn fail_gets(&self, n: u32) {
        self.failing_gets.store(n, Ordering::SeqCst);
    }

    /// Replace the bytes stored at `url`.
    pub fn tamper(&self, url: &str, bytes: &[u8]) {
        self.blobs.lock().insert(url.to_string(), bytes.to_vec());
    }

    /// Successful uploads so far.
    pub fn puts(&self) -> u32 {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl ProofStore for MemoryProofStore {
    async fn put(&self, bytes: &[u8]) -> Result<String> {
        if take_failure(&self.failing_puts) {
            return Err(Error::ProofStore("injected upload failure".to_string()));
        }
        let url = format!("mem://{}", hash_bytes(bytes));
        self.blobs.lock().insert(url.clone(), bytes.to_vec());
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(url)
    }

    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        if take_failure(&self.failing_gets) {
            return Err(Error::ProofStore("injected fetch failure".to_string()));
        }
        self.blobs
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::ProofStore(format!("no blob at {url}")))
    }
}
