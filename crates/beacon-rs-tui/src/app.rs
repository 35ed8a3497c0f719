//! Application state for the Beacon TUI.
//!
//! `App` is owned by the control loop and only mutated through
//! [`crate::transition::transition`].

use beacon_rs_config::UiConfig;
use beacon_rs_protocol::{ConnectionState, ErrorKind, Payload};
use serde::Serialize;

/// Where the client is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStage {
    /// Nothing has happened yet.
    Starting,
    /// A connection attempt is in flight.
    ConnectingToServer,
    /// Reserved for fetching initial data after connecting.
    LoadingInitialData,
    /// Connected and receiving events.
    Ready,
}

impl ApplicationStage {
    /// Short label for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStage::Starting => "starting",
            ApplicationStage::ConnectingToServer => "connecting",
            ApplicationStage::LoadingInitialData => "loading",
            ApplicationStage::Ready => "ready",
        }
    }
}

/// Most recent failure the user has not yet dealt with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorState {
    NoError,
    ConnectionTimeout,
    Unknown,
    Fatal,
}

impl From<ErrorKind> for ErrorState {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ConnectionTimeout => ErrorState::ConnectionTimeout,
            ErrorKind::Unknown => ErrorState::Unknown,
            ErrorKind::Fatal => ErrorState::Fatal,
        }
    }
}

/// Full-screen debug window toggled with F6.
#[derive(Debug, Clone, Default)]
pub struct AltWindow {
    /// Whether the debug window replaces the main view.
    pub focused: bool,
    /// Lifecycle messages, oldest first.
    pub contents: Vec<String>,
}

/// Snapshot written to the debug window by Ctrl+D.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot<'a> {
    pub stage: ApplicationStage,
    pub error_state: ErrorState,
    pub connection: ConnectionState,
    pub connected: bool,
    pub chat_focused: bool,
    pub chat_contents: &'a str,
    pub history_len: usize,
    pub last_sequence: Option<u64>,
}

/// Top-level application state for the TUI.
#[derive(Debug, Clone)]
pub struct App {
    /// Current startup stage.
    pub stage: ApplicationStage,
    /// Current failure, if any.
    pub error_state: ErrorState,
    /// Whether the last attempt reached the server and has not failed since.
    pub connected: bool,
    /// Server payloads in arrival order.
    pub history: Vec<Payload>,
    /// Debug window.
    pub alt_window: AltWindow,
    /// Lines shown in the system pane.
    pub system_pane: Vec<String>,
    /// Current chat input buffer.
    pub input: String,
    /// Whether the chat input accepts keystrokes.
    pub chat_focused: bool,
    /// Maximum number of characters in the chat input.
    pub char_limit: usize,
    /// Endpoint shown in the info pane.
    pub server_url: String,
}

impl App {
    /// Create the startup state. The debug window is focused until the first
    /// connection succeeds.
    pub fn new(ui: &UiConfig) -> Self {
        Self {
            stage: ApplicationStage::Starting,
            error_state: ErrorState::NoError,
            connected: false,
            history: Vec::new(),
            alt_window: AltWindow {
                focused: true,
                contents: Vec::new(),
            },
            system_pane: Vec::new(),
            input: String::new(),
            chat_focused: false,
            char_limit: ui.input_char_limit,
            server_url: String::new(),
        }
    }

    /// Set the endpoint label shown in the info pane.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Whether the retry confirmation gate is active.
    pub fn retry_prompt_active(&self) -> bool {
        self.error_state == ErrorState::ConnectionTimeout
    }

    /// Append a line to the debug window.
    pub fn push_debug(&mut self, line: impl Into<String>) {
        self.alt_window.contents.push(line.into());
    }

    /// Append a line to the system pane.
    pub fn push_system(&mut self, line: impl Into<String>) {
        self.system_pane.push(line.into());
    }

    /// Append a character to the chat input, honoring the length limit.
    pub fn push_input(&mut self, ch: char) -> bool {
        if self.input.chars().count() >= self.char_limit {
            return false;
        }
        self.input.push(ch);
        true
    }

    /// Capture the state shown by the dump key.
    pub fn snapshot(&self, connection: ConnectionState) -> StateSnapshot<'_> {
        StateSnapshot {
            stage: self.stage,
            error_state: self.error_state,
            connection,
            connected: self.connected,
            chat_focused: self.chat_focused,
            chat_contents: &self.input,
            history_len: self.history.len(),
            last_sequence: self.history.last().map(|payload| payload.sequence),
        }
    }
}
