//! Transport abstraction for the push connection.
//!
//! The manager only needs to open a connection and then pull inbound units
//! off it one at a time; everything protocol specific lives behind these
//! traits.

mod websocket;

pub use websocket::WebSocketTransport;

use crate::error::TransportError;
use async_trait::async_trait;

/// Opens connections to the remote event source.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the handshake and return the inbound side of the connection.
    ///
    /// The manager enforces its own timeout around this call.
    async fn open(&self) -> Result<Box<dyn InboundStream>, TransportError>;

    /// Short description used in logs.
    fn describe(&self) -> String {
        "transport".to_string()
    }
}

/// Inbound side of an established connection.
#[async_trait]
pub trait InboundStream: Send {
    /// Next inbound unit, an error, or `None` when the server closed cleanly.
    async fn next_payload(&mut self) -> Option<Result<String, TransportError>>;
}
