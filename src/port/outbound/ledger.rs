//! Ledger event source port.

use async_trait::async_trait;

use crate::domain::event::ConfirmedEvent;
use crate::error::Result;

/// Ordered-per-source stream of confirmed ledger events.
///
/// Delivery is at-least-once: consumers must tolerate duplicates and
/// cross-pool reordering.
#[async_trait]
pub trait Ledger: Send {
    /// Next confirmed event, or `None` once the source is exhausted.
    ///
    /// Must be cancellation safe; the runtime polls it inside `select!`.
    async fn next_event(&mut self) -> Result<Option<ConfirmedEvent>>;

    /// Source name for logging.
    fn name(&self) -> &'static str;
}
