//! Error types for the connection core.

use beacon_rs_protocol::ErrorKind;
use thiserror::Error;

/// Failures reported by a [`crate::Transport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint cannot be used at all (bad url, unsupported scheme).
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// The transport gave up waiting on its own.
    #[error("connection timed out")]
    TimedOut,
    /// The server refused the handshake.
    #[error("handshake rejected: {0}")]
    Handshake(String),
    /// The connection was closed underneath the reader.
    #[error("connection closed")]
    Closed,
    /// Socket level failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Framing or protocol violation.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Classify the failure for the UI.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransportError::InvalidEndpoint(_) => ErrorKind::Fatal,
            TransportError::TimedOut => ErrorKind::ConnectionTimeout,
            TransportError::Io(err) if err.kind() == std::io::ErrorKind::TimedOut => {
                ErrorKind::ConnectionTimeout
            }
            TransportError::Handshake(_)
            | TransportError::Closed
            | TransportError::Io(_)
            | TransportError::Protocol(_) => ErrorKind::Unknown,
        }
    }
}
