//! Library entry point for the Beacon TUI.
//!
//! Provides a reusable [`run`] function that connects to the configured event
//! source and drives the Ratatui terminal UI until the user quits or the
//! connection fails fatally.

pub mod app;
pub mod bridge;
pub mod event;
mod listener;
pub mod transition;
mod ui;

pub use app::{App, ApplicationStage, ErrorState};
pub use bridge::{Bridge, Control};
pub use event::AppEvent;
pub use transition::{Effect, transition};

use anyhow::{Context, anyhow};
use beacon_rs_config::BeaconConfig;
use beacon_rs_core::{ConnectionManager, Connector};
use crossterm::event::Event as CrosstermEvent;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::{debug, error, info};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Launch the Beacon TUI against the server named in `config`.
///
/// The caller is responsible for initializing logging before calling `run`.
/// Logging must not target stdout or stderr while the terminal is in raw mode.
///
/// # Errors
/// Returns an error if terminal setup, drawing, or the event loop fails.
pub async fn run(config: BeaconConfig) -> anyhow::Result<()> {
    info!(
        "starting tui (url={}, timeout_ms={}, buffer={})",
        config.server.url, config.server.connect_timeout_ms, config.delivery.buffer
    );
    let connector = ConnectionManager::from_config(&config);
    let app = App::new(&config.ui).with_server_url(config.server.url.clone());
    let mut bridge = Bridge::new(app, connector);

    let mut terminal = setup_terminal().context("failed to set up terminal")?;
    let (tx, mut rx) = mpsc::channel(256);
    spawn_input_handler(tx, Duration::from_millis(config.ui.input_poll_ms));

    let result = event_loop(&mut terminal, &mut bridge, &mut rx).await;
    let restored = restore_terminal(&mut terminal);
    finish(result, restored)
}

/// Combine the loop outcome with the terminal restore. A loop error wins;
/// a restore failure behind it is only logged.
fn finish(result: anyhow::Result<()>, restored: anyhow::Result<()>) -> anyhow::Result<()> {
    match (result, restored) {
        (result, Ok(())) => result,
        (Ok(()), Err(err)) => Err(err.context("failed to restore terminal")),
        (Err(err), Err(restore_err)) => {
            error!("failed to restore terminal (error={:#})", restore_err);
            Err(err)
        }
    }
}

/// Draw, wait for one event, apply it; until a transition asks to quit.
async fn event_loop<C: Connector>(
    terminal: &mut Tui,
    bridge: &mut Bridge<C>,
    input: &mut mpsc::Receiver<AppEvent>,
) -> anyhow::Result<()> {
    let mut pending = Some(AppEvent::Init);
    loop {
        terminal.draw(|frame| ui::draw(frame, bridge.app()))?;
        let event = match pending.take() {
            Some(event) => event,
            None => bridge
                .next_event(input)
                .await
                .ok_or_else(|| anyhow!("input channel closed unexpectedly"))?,
        };
        if bridge.handle(event) == Control::Quit {
            info!("event loop finished");
            return Ok(());
        }
    }
}

/// Poll crossterm for key events on a blocking thread.
fn spawn_input_handler(sender: mpsc::Sender<AppEvent>, poll_interval: Duration) {
    tokio::task::spawn_blocking(move || {
        loop {
            if !matches!(crossterm::event::poll(poll_interval), Ok(true)) {
                if sender.is_closed() {
                    break;
                }
                continue;
            }
            let event = match crossterm::event::read() {
                Ok(event) => event,
                Err(err) => {
                    debug!("terminal read failed (error={})", err);
                    continue;
                }
            };
            if let CrosstermEvent::Key(key) = event
                && sender.blocking_send(AppEvent::Input(key)).is_err()
            {
                break;
            }
        }
        debug!("input handler stopped");
    });
}

/// Configure terminal in raw mode with alternate screen.
fn setup_terminal() -> anyhow::Result<Tui> {
    debug!("setting up terminal");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal state on exit.
fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    debug!("restoring terminal");
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
