use beacon_rs_core::{
    ConnectAttempt, ConnectionState, Connector, DeliverySender, delivery_channel,
};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    connects: usize,
    retries: usize,
    shutdowns: usize,
    in_progress: bool,
    senders: Vec<DeliverySender>,
}

/// Connector that hands out plain delivery channels and records every call.
///
/// Clones share state, so a test can keep one handle while the bridge owns
/// another and push events through [`ScriptedConnector::latest_sender`].
#[derive(Clone)]
pub struct ScriptedConnector {
    buffer: usize,
    inner: Arc<Mutex<Inner>>,
}

impl ScriptedConnector {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Make subsequent connects report an attempt already in flight.
    pub fn set_in_progress(&self, in_progress: bool) {
        self.inner.lock().in_progress = in_progress;
    }

    pub fn connect_calls(&self) -> usize {
        self.inner.lock().connects
    }

    pub fn retry_calls(&self) -> usize {
        self.inner.lock().retries
    }

    /// Connects plus retries.
    pub fn total_attempts(&self) -> usize {
        let inner = self.inner.lock();
        inner.connects + inner.retries
    }

    pub fn shutdown_calls(&self) -> usize {
        self.inner.lock().shutdowns
    }

    /// Write end of the most recently started channel.
    pub fn latest_sender(&self) -> Option<DeliverySender> {
        self.inner.lock().senders.last().cloned()
    }

    /// Drop every retained sender so the handed-out channels close.
    pub fn close_channels(&self) {
        self.inner.lock().senders.clear();
    }

    fn start(&self) -> ConnectAttempt {
        let mut inner = self.inner.lock();
        if inner.in_progress {
            return ConnectAttempt::InProgress;
        }
        let (sender, receiver) = delivery_channel(self.buffer);
        inner.senders.push(sender);
        ConnectAttempt::Started(receiver)
    }
}

impl Connector for ScriptedConnector {
    fn connect(&mut self) -> ConnectAttempt {
        self.inner.lock().connects += 1;
        self.start()
    }

    fn retry(&mut self) -> ConnectAttempt {
        self.inner.lock().retries += 1;
        self.start()
    }

    fn state(&self) -> ConnectionState {
        if self.inner.lock().in_progress {
            ConnectionState::Connecting
        } else {
            ConnectionState::Idle
        }
    }

    fn shutdown(&mut self) {
        self.inner.lock().shutdowns += 1;
    }
}
