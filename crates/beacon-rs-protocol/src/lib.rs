//! Shared types for Beacon connection lifecycle and event delivery.
//!
//! These values cross the boundary between the connection manager (which runs
//! on its own task) and the UI control loop. They are plain, owned data so
//! they can be moved through the delivery channel without shared references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a connection failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The attempt did not complete within the configured timeout.
    ConnectionTimeout,
    /// Any other failure; surfaced but not retried automatically.
    Unknown,
    /// The client is in a configuration it cannot recover from.
    Fatal,
}

impl ErrorKind {
    /// Whether the user may be offered a retry for this failure.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorKind::ConnectionTimeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::ConnectionTimeout => "connection timeout",
            ErrorKind::Unknown => "unknown error",
            ErrorKind::Fatal => "fatal error",
        };
        f.write_str(label)
    }
}

/// Lifecycle state of the single logical server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum ConnectionState {
    /// No attempt has been made, or the connection was shut down.
    #[default]
    Idle,
    /// An attempt is in flight.
    Connecting,
    /// The handshake completed and inbound data is being read.
    Established,
    /// The last attempt or the live connection failed.
    Failed(ErrorKind),
}

/// One inbound unit of data pushed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Arrival position within the current connection, starting at 1.
    pub sequence: u64,
    /// Opaque payload body.
    pub body: String,
}

impl Payload {
    /// Create a payload with the given arrival sequence.
    pub fn new(sequence: u64, body: impl Into<String>) -> Self {
        Self {
            sequence,
            body: body.into(),
        }
    }
}

/// Event pushed from the connection manager to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum DeliveryEvent {
    /// The connection was established.
    Connected,
    /// The server pushed a unit of data.
    DataReceived(Payload),
    /// The attempt or the live connection failed.
    Error {
        /// Failure classification driving the UI transition.
        kind: ErrorKind,
        /// Human-readable reason.
        detail: String,
    },
}

impl DeliveryEvent {
    /// Build an error event.
    pub fn error(kind: ErrorKind, detail: impl Into<String>) -> Self {
        DeliveryEvent::Error {
            kind,
            detail: detail.into(),
        }
    }
}
