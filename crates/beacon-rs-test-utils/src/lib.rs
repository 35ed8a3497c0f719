//! Test helpers shared across Beacon crates.

pub mod connector;
pub mod transport;

pub use connector::ScriptedConnector;
pub use transport::{MockFrame, MockOpen, MockTransport};
