//! Bridge between the connection core and the UI state.
//!
//! Every loop iteration hands exactly one [`AppEvent`] to [`Bridge::handle`],
//! which applies the pure transition, carries out the requested effects and
//! then re-arms the listener if the event came off the delivery channel.

use crate::app::App;
use crate::event::AppEvent;
use crate::listener::Listener;
use crate::transition::{Effect, transition};
use beacon_rs_core::{ConnectAttempt, Connector};
use log::{debug, info, warn};
use tokio::sync::mpsc;

/// Whether the control loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Owns the application state, the connector and the delivery listener.
pub struct Bridge<C: Connector> {
    app: App,
    connector: C,
    listener: Listener,
}

impl<C: Connector> Bridge<C> {
    pub fn new(app: App, connector: C) -> Self {
        Self {
            app,
            connector,
            listener: Listener::new(),
        }
    }

    /// Current application state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Whether a delivery listen may currently be awaited.
    pub fn is_listening(&self) -> bool {
        self.listener.is_armed()
    }

    /// Apply one event. Re-arms the listener after any delivered event,
    /// including ones the transition ignored.
    pub fn handle(&mut self, event: AppEvent) -> Control {
        let delivered = matches!(event, AppEvent::Delivery(_));
        let effects = transition(&mut self.app, &event);

        let mut control = Control::Continue;
        for effect in effects {
            if self.execute(effect) == Control::Quit {
                control = Control::Quit;
                break;
            }
        }

        if delivered && control == Control::Continue {
            self.listener.rearm();
        }
        control
    }

    /// Wait for the next input or delivery item, whichever comes first.
    ///
    /// Returns `None` when the input channel is closed.
    pub async fn next_event(&mut self, input: &mut mpsc::Receiver<AppEvent>) -> Option<AppEvent> {
        tokio::select! {
            event = input.recv() => event,
            event = self.listener.listen() => Some(event),
        }
    }

    fn execute(&mut self, effect: Effect) -> Control {
        match effect {
            Effect::Connect => {
                let attempt = self.connector.connect();
                self.start_listening(attempt, "connect");
            }
            Effect::Retry => {
                let attempt = self.connector.retry();
                self.start_listening(attempt, "retry");
            }
            Effect::DumpState => {
                let snapshot = self.app.snapshot(self.connector.state());
                let dump = match serde_json::to_string_pretty(&snapshot) {
                    Ok(dump) => dump,
                    Err(err) => format!("state dump failed: {err}"),
                };
                self.app.push_debug(dump);
            }
            Effect::Shutdown => {
                info!("shutting down (stage={:?})", self.app.stage);
                self.connector.shutdown();
                return Control::Quit;
            }
        }
        Control::Continue
    }

    fn start_listening(&mut self, attempt: ConnectAttempt, action: &str) {
        match attempt {
            ConnectAttempt::Started(receiver) => {
                debug!("listening on new delivery channel (action={})", action);
                self.listener.attach(receiver);
            }
            ConnectAttempt::InProgress => {
                warn!("connection attempt already in flight (action={})", action);
            }
        }
    }
}
