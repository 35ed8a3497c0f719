//! Connection-and-delivery core for the Beacon client.
//!
//! The [`ConnectionManager`] owns the lifecycle of one logical server
//! connection. Each attempt runs on its own tokio task and reports everything
//! it observes through a fresh delivery channel, whose read end is handed to
//! the caller. Nothing else about the connection is shared with the UI.

pub mod channel;
pub mod error;
pub mod manager;
pub mod transport;

pub use channel::{DeliveryClosed, DeliveryReceiver, DeliverySender, delivery_channel};
pub use error::TransportError;
pub use manager::{ConnectAttempt, ConnectionManager, ConnectionOptions, Connector};
pub use transport::{InboundStream, Transport, WebSocketTransport};

pub use beacon_rs_protocol::{ConnectionState, DeliveryEvent, ErrorKind, Payload};
