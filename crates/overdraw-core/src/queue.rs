//! Event Queue
//!
//! Unbounded multi-producer hand-off from producer tasks into the single
//! ingestion loop. Producers never wait on the consumer.

use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::stroke::DrawEvent;

/// Item carried by the queue
#[derive(Debug)]
pub(crate) enum QueueItem {
    /// A point to append
    Draw(DrawEvent),
    /// Barrier: acknowledged once every earlier item has been applied
    Flush(oneshot::Sender<()>),
}

/// Create a connected sender/receiver pair
#[must_use]
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer handle; clone one per connection
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<QueueItem>,
}

impl EventSender {
    /// Submit a draw event.
    ///
    /// Validates the event and hands it to the ingestion loop without
    /// waiting for it to be applied.
    pub fn submit(&self, event: DrawEvent) -> Result<()> {
        event.validate()?;
        self.tx
            .send(QueueItem::Draw(event))
            .map_err(|_| Error::QueueClosed)
    }

    /// Wait until every event submitted through any sender before this call
    /// has been applied to the registry
    pub async fn flush(&self) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(QueueItem::Flush(ack_tx))
            .map_err(|_| Error::QueueClosed)?;
        ack_rx.await.map_err(|_| Error::QueueClosed)
    }

    /// The ingestion loop has stopped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer handle owned by the ingestion loop
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<QueueItem>,
}

impl EventReceiver {
    pub(crate) async fn recv(&mut self) -> Option<QueueItem> {
        self.rx.recv().await
    }

    /// Stop accepting events; already queued items can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}
