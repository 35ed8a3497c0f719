//! Single outstanding listen on the delivery channel.

use crate::event::AppEvent;
use beacon_rs_core::DeliveryReceiver;
use log::debug;

#[derive(Debug, Default)]
enum ListenState {
    /// No channel attached.
    #[default]
    Idle,
    /// Waiting for the next item may begin.
    Armed(DeliveryReceiver),
    /// An item was taken and has not been applied yet.
    Parked(DeliveryReceiver),
}

/// Owns the read end of the current delivery channel.
///
/// Only an armed listener yields items. Taking one parks it until
/// [`Listener::rearm`], so two listens can never overlap.
#[derive(Debug, Default)]
pub struct Listener {
    state: ListenState,
}

impl Listener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current channel with a fresh one and arm it.
    pub fn attach(&mut self, receiver: DeliveryReceiver) {
        if !matches!(self.state, ListenState::Idle) {
            debug!("replacing delivery channel");
        }
        self.state = ListenState::Armed(receiver);
    }

    /// Allow the next item to be taken.
    pub fn rearm(&mut self) {
        self.state = match std::mem::take(&mut self.state) {
            ListenState::Parked(receiver) => ListenState::Armed(receiver),
            other => other,
        };
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, ListenState::Armed(_))
    }

    /// Wait for the next delivery item and turn it into a loop event.
    ///
    /// Pends forever unless armed. Cancel safe: dropping the future before it
    /// resolves leaves the listener armed and the item in the channel.
    pub async fn listen(&mut self) -> AppEvent {
        let ListenState::Armed(receiver) = &mut self.state else {
            return std::future::pending().await;
        };
        let item = receiver.recv().await;
        match item {
            Some(event) => {
                if let ListenState::Armed(receiver) = std::mem::take(&mut self.state) {
                    self.state = ListenState::Parked(receiver);
                }
                AppEvent::Delivery(event)
            }
            None => {
                debug!("delivery channel drained and closed; listener idle");
                self.state = ListenState::Idle;
                AppEvent::DeliveryClosed
            }
        }
    }
}
