//! TUI event types for input and delivery messages.

use beacon_rs_protocol::DeliveryEvent;
use crossterm::event::KeyEvent;

/// Event consumed by the control loop, one per iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Startup; kicks off the first connection attempt.
    Init,
    /// Keyboard input event.
    Input(KeyEvent),
    /// Event pushed by the connection manager.
    Delivery(DeliveryEvent),
    /// Every sender of the current delivery channel is gone.
    DeliveryClosed,
}
