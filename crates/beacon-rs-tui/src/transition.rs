//! State transitions for the Beacon TUI.
//!
//! [`transition`] applies one [`AppEvent`] to the [`App`] and returns the
//! side effects the bridge must carry out. It performs no I/O.

use crate::app::{App, ApplicationStage, ErrorState};
use crate::event::AppEvent;
use beacon_rs_protocol::{DeliveryEvent, ErrorKind, Payload};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info, warn};

/// Debug window line shown while the first attempt is running.
pub const CONNECTING_MESSAGE: &str = "Connecting to server...";
/// Debug window line shown once the server accepted the connection.
pub const CONNECTED_MESSAGE: &str = "Connected!";
/// Debug window line for the retry gate.
pub const RETRY_PROMPT: &str = "Server Connection Failed. Retry? (Y/N)";

/// Work requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Start the first connection attempt.
    Connect,
    /// Start a fresh attempt after a recoverable failure.
    Retry,
    /// Write a state dump into the debug window.
    DumpState,
    /// Stop the connection and leave the loop.
    Shutdown,
}

/// Apply `event` to `app` and return the effects to execute, in order.
pub fn transition(app: &mut App, event: &AppEvent) -> Vec<Effect> {
    match event {
        AppEvent::Init => on_init(app),
        AppEvent::Input(key) => on_key(app, key),
        AppEvent::Delivery(event) => on_delivery(app, event),
        AppEvent::DeliveryClosed => {
            debug!("delivery channel closed (stage={:?})", app.stage);
            Vec::new()
        }
    }
}

fn on_init(app: &mut App) -> Vec<Effect> {
    if app.stage != ApplicationStage::Starting {
        warn!("init ignored (stage={:?})", app.stage);
        return Vec::new();
    }
    app.stage = ApplicationStage::ConnectingToServer;
    app.push_debug(CONNECTING_MESSAGE);
    vec![Effect::Connect]
}

fn on_delivery(app: &mut App, event: &DeliveryEvent) -> Vec<Effect> {
    match event {
        DeliveryEvent::Connected => {
            if app.stage != ApplicationStage::ConnectingToServer {
                warn!("unexpected connected event ignored (stage={:?})", app.stage);
                return Vec::new();
            }
            info!("server connection established");
            app.stage = ApplicationStage::Ready;
            app.connected = true;
            app.push_debug(CONNECTED_MESSAGE);
            app.alt_window.focused = false;
            app.chat_focused = true;
            Vec::new()
        }
        DeliveryEvent::DataReceived(payload) => {
            if app.stage != ApplicationStage::Ready {
                warn!(
                    "payload outside ready stage ignored (stage={:?}, sequence={})",
                    app.stage, payload.sequence
                );
                return Vec::new();
            }
            append_history(app, payload);
            Vec::new()
        }
        DeliveryEvent::Error { kind, detail } => on_error(app, *kind, detail),
    }
}

fn append_history(app: &mut App, payload: &Payload) {
    if let Some(last) = app.history.last()
        && payload.sequence <= last.sequence
    {
        debug!(
            "payload sequence restarted (previous={}, sequence={})",
            last.sequence, payload.sequence
        );
    }
    app.history.push(payload.clone());
}

fn on_error(app: &mut App, kind: ErrorKind, detail: &str) -> Vec<Effect> {
    app.error_state = ErrorState::from(kind);
    app.connected = false;
    if kind.is_retryable() {
        warn!("{kind}; awaiting retry decision (detail={detail})");
        app.push_debug(RETRY_PROMPT);
        app.alt_window.focused = true;
        return Vec::new();
    }
    match kind {
        ErrorKind::Fatal => {
            warn!("{kind}; shutting down (detail={detail})");
            app.push_debug(format!("Fatal error: {detail}"));
            vec![Effect::Shutdown]
        }
        _ => {
            warn!("{kind} surfaced (detail={detail})");
            let line = format!("Connection error: {detail}");
            app.push_debug(line.clone());
            app.push_system(line);
            Vec::new()
        }
    }
}

fn on_key(app: &mut App, key: &KeyEvent) -> Vec<Effect> {
    if key.kind == KeyEventKind::Release {
        return Vec::new();
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::F(6) => {
            app.alt_window.focused = !app.alt_window.focused;
            return Vec::new();
        }
        KeyCode::Char('d') if ctrl => return vec![Effect::DumpState],
        KeyCode::Char('q') | KeyCode::Char('c') if ctrl => {
            info!("quit requested");
            return vec![Effect::Shutdown];
        }
        _ => {}
    }

    if app.retry_prompt_active() {
        return on_retry_prompt_key(app, key);
    }
    if app.alt_window.focused {
        return Vec::new();
    }
    on_chat_key(app, key);
    Vec::new()
}

fn on_retry_prompt_key(app: &mut App, key: &KeyEvent) -> Vec<Effect> {
    let KeyCode::Char(ch) = key.code else {
        return Vec::new();
    };
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return Vec::new();
    }
    match ch.to_ascii_lowercase() {
        'y' => {
            info!("retry confirmed");
            app.error_state = ErrorState::NoError;
            app.stage = ApplicationStage::ConnectingToServer;
            app.push_debug(CONNECTING_MESSAGE);
            vec![Effect::Retry]
        }
        'n' => {
            info!("retry declined");
            vec![Effect::Shutdown]
        }
        _ => Vec::new(),
    }
}

fn on_chat_key(app: &mut App, key: &KeyEvent) {
    match key.code {
        KeyCode::Enter => {
            if !app.chat_focused {
                app.chat_focused = true;
            }
            if !app.input.is_empty() {
                let line = std::mem::take(&mut app.input);
                debug!("chat line submitted (len={})", line.len());
                app.push_system(format!("Sent msg: {line}"));
            }
        }
        KeyCode::Backspace if app.chat_focused => {
            app.input.pop();
        }
        KeyCode::Char(ch) if app.chat_focused => {
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
            {
                return;
            }
            app.push_input(ch);
        }
        _ => {}
    }
}
