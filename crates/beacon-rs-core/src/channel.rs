//! Delivery channel between the connection task and the UI loop.
//!
//! A bounded tokio mpsc queue: a full buffer makes the producer wait rather
//! than drop, so every event the connection observes reaches the reader in
//! order. One channel exists per connection attempt.

use beacon_rs_protocol::DeliveryEvent;
use log::debug;
use thiserror::Error;
use tokio::sync::mpsc;

/// The reading side of the channel went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("delivery channel closed")]
pub struct DeliveryClosed;

/// Write end, held by the connection task.
#[derive(Clone, Debug)]
pub struct DeliverySender {
    sender: mpsc::Sender<DeliveryEvent>,
}

/// Read end, held by the UI loop.
#[derive(Debug)]
pub struct DeliveryReceiver {
    receiver: mpsc::Receiver<DeliveryEvent>,
}

/// Create a delivery channel that buffers up to `buffer` events.
pub fn delivery_channel(buffer: usize) -> (DeliverySender, DeliveryReceiver) {
    let buffer = buffer.max(1);
    let (sender, receiver) = mpsc::channel(buffer);
    debug!("delivery channel created (buffer={})", buffer);
    (DeliverySender { sender }, DeliveryReceiver { receiver })
}

impl DeliverySender {
    /// Push an event, waiting for buffer space if needed.
    pub async fn deliver(&self, event: DeliveryEvent) -> Result<(), DeliveryClosed> {
        self.sender.send(event).await.map_err(|_| DeliveryClosed)
    }

    /// Whether the reading side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl DeliveryReceiver {
    /// Wait for the next event. Returns `None` once every sender is gone and
    /// the buffer is drained.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    pub async fn recv(&mut self) -> Option<DeliveryEvent> {
        self.receiver.recv().await
    }
}
