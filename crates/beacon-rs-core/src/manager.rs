//! Connection lifecycle management.
//!
//! [`ConnectionManager::connect`] returns as soon as the attempt task is
//! spawned. The task owns the write end of a new delivery channel and reports
//! `Connected`, every inbound payload, and the terminal failure (if any) in
//! the order it observed them. State writes are tagged with the attempt
//! number, so a superseded task can never overwrite the state of a newer one.

use crate::channel::{DeliveryReceiver, DeliverySender, delivery_channel};
use crate::transport::{Transport, WebSocketTransport};
use beacon_rs_config::BeaconConfig;
use beacon_rs_protocol::{ConnectionState, DeliveryEvent, ErrorKind, Payload};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Outcome of a connect or retry request.
#[derive(Debug)]
pub enum ConnectAttempt {
    /// A fresh attempt was started; events arrive on this receiver.
    Started(DeliveryReceiver),
    /// An attempt is already in flight; nothing was started.
    InProgress,
}

/// The entry points the UI loop uses to drive the connection.
pub trait Connector: Send {
    /// Start a connection attempt.
    fn connect(&mut self) -> ConnectAttempt;

    /// Start a fresh attempt after a failure.
    fn retry(&mut self) -> ConnectAttempt {
        self.connect()
    }

    /// Current lifecycle state.
    fn state(&self) -> ConnectionState;

    /// Stop any running attempt.
    fn shutdown(&mut self) {}
}

/// Tuning for connection attempts.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Upper bound on the handshake.
    pub connect_timeout: Duration,
    /// Delivery channel capacity.
    pub buffer: usize,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            buffer: 256,
        }
    }
}

impl From<&BeaconConfig> for ConnectionOptions {
    fn from(config: &BeaconConfig) -> Self {
        Self {
            connect_timeout: config.server.connect_timeout(),
            buffer: config.delivery.buffer,
        }
    }
}

#[derive(Debug, Default)]
struct StateSlot {
    attempt: u64,
    state: ConnectionState,
}

/// Connection state shared between the manager and its attempt task.
#[derive(Debug, Default)]
struct SharedState {
    slot: Mutex<StateSlot>,
}

impl SharedState {
    fn get(&self) -> ConnectionState {
        self.slot.lock().state
    }

    /// Begin a new attempt unless one is already connecting.
    fn begin_attempt(&self) -> Option<u64> {
        let mut slot = self.slot.lock();
        if slot.state == ConnectionState::Connecting {
            return None;
        }
        slot.attempt += 1;
        slot.state = ConnectionState::Connecting;
        Some(slot.attempt)
    }

    /// Write `state` if `attempt` is still the current one.
    fn set_if_current(&self, attempt: u64, state: ConnectionState) -> bool {
        let mut slot = self.slot.lock();
        if slot.attempt != attempt {
            return false;
        }
        slot.state = state;
        true
    }

    /// Invalidate every running attempt and return to idle.
    fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.attempt += 1;
        slot.state = ConnectionState::Idle;
    }
}

/// Owns the single logical connection to the event source.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    options: ConnectionOptions,
    state: Arc<SharedState>,
    task: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Create a manager over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, options: ConnectionOptions) -> Self {
        Self {
            transport,
            options,
            state: Arc::new(SharedState::default()),
            task: None,
        }
    }

    /// Create a websocket-backed manager from config.
    pub fn from_config(config: &BeaconConfig) -> Self {
        let transport = Arc::new(WebSocketTransport::new(config.server.url.clone()));
        Self::new(transport, ConnectionOptions::from(config))
    }
}

impl Connector for ConnectionManager {
    fn connect(&mut self) -> ConnectAttempt {
        let Some(attempt) = self.state.begin_attempt() else {
            debug!("connect ignored; attempt already in flight");
            return ConnectAttempt::InProgress;
        };
        if let Some(task) = self.task.take() {
            debug!("aborting previous connection task (attempt={})", attempt);
            task.abort();
        }

        let (sender, receiver) = delivery_channel(self.options.buffer);
        info!(
            "starting connection attempt (attempt={}, target={}, timeout_ms={})",
            attempt,
            self.transport.describe(),
            self.options.connect_timeout.as_millis()
        );
        let worker = AttemptWorker {
            attempt,
            transport: self.transport.clone(),
            connect_timeout: self.options.connect_timeout,
            state: self.state.clone(),
            sender,
        };
        self.task = Some(tokio::spawn(worker.run()));
        ConnectAttempt::Started(receiver)
    }

    fn state(&self) -> ConnectionState {
        self.state.get()
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            info!("shutting down connection");
            task.abort();
        }
        self.state.reset();
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Body of one connection attempt.
struct AttemptWorker {
    attempt: u64,
    transport: Arc<dyn Transport>,
    connect_timeout: Duration,
    state: Arc<SharedState>,
    sender: DeliverySender,
}

impl AttemptWorker {
    async fn run(self) {
        let opened = tokio::time::timeout(self.connect_timeout, self.transport.open()).await;
        let mut inbound = match opened {
            Err(_) => {
                let detail = format!(
                    "no response within {}ms",
                    self.connect_timeout.as_millis()
                );
                return self.fail(ErrorKind::ConnectionTimeout, detail).await;
            }
            Ok(Err(err)) => return self.fail(err.kind(), err.to_string()).await,
            Ok(Ok(inbound)) => inbound,
        };

        if !self
            .state
            .set_if_current(self.attempt, ConnectionState::Established)
        {
            debug!("attempt superseded before delivery (attempt={})", self.attempt);
            return;
        }
        info!("connection established (attempt={})", self.attempt);
        if self.sender.deliver(DeliveryEvent::Connected).await.is_err() {
            debug!("receiver dropped (attempt={})", self.attempt);
            return;
        }

        let mut sequence = 0u64;
        loop {
            match inbound.next_payload().await {
                Some(Ok(body)) => {
                    sequence += 1;
                    let event = DeliveryEvent::DataReceived(Payload::new(sequence, body));
                    if self.sender.deliver(event).await.is_err() {
                        debug!(
                            "receiver dropped; stopping reader (attempt={}, sequence={})",
                            self.attempt, sequence
                        );
                        return;
                    }
                }
                Some(Err(err)) => return self.fail(err.kind(), err.to_string()).await,
                None => {
                    return self
                        .fail(ErrorKind::Unknown, "connection closed by server".to_string())
                        .await;
                }
            }
        }
    }

    /// Record the failure, then report it. The state is written first so a
    /// retry issued in response to the event never observes `Connecting`.
    async fn fail(&self, kind: ErrorKind, detail: String) {
        warn!(
            "connection failed (attempt={}, kind={}, detail={})",
            self.attempt, kind, detail
        );
        if !self
            .state
            .set_if_current(self.attempt, ConnectionState::Failed(kind))
        {
            debug!("stale failure ignored (attempt={})", self.attempt);
            return;
        }
        if self
            .sender
            .deliver(DeliveryEvent::error(kind, detail))
            .await
            .is_err()
        {
            warn!(
                "failure could not be delivered; receiver dropped (attempt={})",
                self.attempt
            );
        }
    }
}
