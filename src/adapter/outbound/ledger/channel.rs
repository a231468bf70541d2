//! Channel-backed ledger source.
//!
//! An indexer task pushes confirmed events into the sender half; the
//! runtime consumes them through [`Ledger`]. Closing every sender ends the
//! stream.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::event::ConfirmedEvent;
use crate::error::Result;
use crate::port::outbound::ledger::Ledger;

pub struct ChannelLedger {
    events: mpsc::Receiver<ConfirmedEvent>,
}

impl ChannelLedger {
    /// Create a ledger and the sender that feeds it.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, mpsc::Sender<ConfirmedEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { events: rx }, tx)
    }
}

#[async_trait]
impl Ledger for ChannelLedger {
    async fn next_event(&mut self) -> Result<Option<ConfirmedEvent>> {
        Ok(self.events.recv().await)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::LedgerEvent;
    use crate::domain::id::PoolId;
    use chrono::Utc;

    #[tokio::test]
    async fn delivers_until_senders_drop() {
        let (mut ledger, tx) = ChannelLedger::channel(4);
        let event = ConfirmedEvent::new(
            LedgerEvent::PoolLockedConfirmed {
                pool_id: PoolId::new(1),
            },
            Utc::now(),
        );
        tx.send(event.clone()).await.unwrap();
        drop(tx);

        assert_eq!(ledger.next_event().await.unwrap(), Some(event));
        assert_eq!(ledger.next_event().await.unwrap(), None);
    }
}
