//! Rendering routines for the Beacon TUI.

use crate::app::{App, ApplicationStage, ErrorState};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};

const PRIMARY: Color = Color::Rgb(255, 95, 135); // #FF5F87
const TEXT: Color = Color::Rgb(238, 238, 238);
const TEXT_MUTED: Color = Color::Rgb(128, 128, 128);
const BORDER: Color = Color::Rgb(60, 60, 60);
const BORDER_ACTIVE: Color = Color::Rgb(175, 175, 175); // #AFAFAF
const YELLOW: Color = Color::Rgb(229, 192, 123);
const RED: Color = Color::Rgb(255, 110, 110);
const GREEN: Color = Color::Rgb(120, 220, 140);

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Draw the entire TUI frame.
pub fn draw(frame: &mut Frame<'_>, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // body
            Constraint::Length(1), // status bar
        ])
        .split(frame.area());

    if app.alt_window.focused {
        draw_alt_view(frame, app, root[0]);
    } else {
        draw_main_view(frame, app, root[0]);
    }
    draw_status_bar(frame, app, root[1]);
}

/// Info pane on the left, chat and system panes stacked on the right.
fn draw_main_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(2, 3)])
        .split(area);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Ratio(2, 3), Constraint::Ratio(1, 3)])
        .split(cols[1]);

    draw_info_pane(frame, app, cols[0]);
    draw_chat_pane(frame, app, right[0]);
    draw_system_pane(frame, app, right[1]);
}

fn pane_block(title: &'static str, active: bool) -> Block<'static> {
    let border = if active { BORDER_ACTIVE } else { BORDER };
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(border))
        .title(Span::styled(title, Style::default().fg(TEXT_MUTED)))
}

fn draw_info_pane(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let label = Style::default().fg(TEXT_MUTED);
    let value = Style::default().fg(TEXT);
    let connection = if app.connected {
        Span::styled("connected", Style::default().fg(GREEN))
    } else {
        Span::styled("offline", Style::default().fg(YELLOW))
    };
    let last_sequence = app
        .history
        .last()
        .map(|payload| payload.sequence.to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(Span::styled(
            format!(" beacon v{VERSION}"),
            Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(" server  ", label),
            Span::styled(app.server_url.as_str(), value),
        ]),
        Line::from(vec![Span::styled(" link    ", label), connection]),
        Line::from(vec![
            Span::styled(" stage   ", label),
            Span::styled(app.stage.label(), value),
        ]),
        Line::from(vec![
            Span::styled(" error   ", label),
            Span::styled(error_label(app.error_state), error_style(app.error_state)),
        ]),
        Line::from(vec![
            Span::styled(" events  ", label),
            Span::styled(app.history.len().to_string(), value),
        ]),
        Line::from(vec![
            Span::styled(" last    ", label),
            Span::styled(last_sequence, value),
        ]),
    ];

    let paragraph = Paragraph::new(lines)
        .block(pane_block(" Info ", false))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// History viewport with the chat input on its last line.
fn draw_chat_pane(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = pane_block(" Chat ", app.chat_focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(inner);

    // Keep the newest payloads visible.
    let visible = rows[0].height as usize;
    let start = app.history.len().saturating_sub(visible);
    let history: Vec<Line<'_>> = app.history[start..]
        .iter()
        .map(|payload| {
            Line::from(vec![
                Span::styled(
                    format!("{:>4} ", payload.sequence),
                    Style::default().fg(TEXT_MUTED),
                ),
                Span::styled(payload.body.as_str(), Style::default().fg(TEXT)),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(history), rows[0]);

    let input_style = Style::default().fg(Color::Black).bg(BORDER_ACTIVE);
    let prompt_style = Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD);
    let input = Line::from(vec![
        Span::styled("> ", prompt_style),
        Span::styled(app.input.as_str(), input_style),
    ]);
    frame.render_widget(Paragraph::new(input), rows[1]);

    if app.chat_focused {
        let offset = u16::try_from(app.input.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        let x = rows[1].x + offset.min(rows[1].width.saturating_sub(1));
        frame.set_cursor_position((x, rows[1].y));
    }
}

fn draw_system_pane(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = pane_block(" System ", false);
    let visible = block.inner(area).height as usize;
    let start = app.system_pane.len().saturating_sub(visible);
    let lines: Vec<Line<'_>> = app.system_pane[start..]
        .iter()
        .map(|line| Line::from(Span::styled(line.as_str(), Style::default().fg(TEXT))))
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Full-screen debug window.
fn draw_alt_view(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let block = pane_block(" Debug ", true);
    let visible = block.inner(area).height as usize;
    let lines: Vec<Line<'_>> = app
        .alt_window
        .contents
        .iter()
        .flat_map(|entry| entry.lines())
        .map(|line| Line::from(Span::styled(line, Style::default().fg(TEXT))))
        .collect();
    let start = lines.len().saturating_sub(visible);
    let paragraph = Paragraph::new(lines[start..].to_vec()).block(block);
    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom.
fn draw_status_bar(frame: &mut Frame<'_>, app: &App, area: Rect) {
    let chunk = Style::default().fg(Color::Rgb(255, 253, 245)).bg(PRIMARY);
    let middle_style = Style::default().fg(Color::Black).bg(BORDER_ACTIVE);

    let left = " BEACON ".to_string();
    let right = if app.retry_prompt_active() {
        " retry? y/n ".to_string()
    } else {
        format!(" {} ", app.stage.label())
    };
    let hints = if app.stage == ApplicationStage::Ready {
        "F6 debug  Ctrl+D dump  Ctrl+Q quit  Enter send"
    } else {
        "F6 debug  Ctrl+D dump  Ctrl+Q quit"
    };

    let left_len = left.len() as u16;
    let right_len = right.len() as u16;
    let middle_width = area.width.saturating_sub(left_len + right_len) as usize;

    let line = Line::from(vec![
        Span::styled(left, chunk),
        Span::styled(format!("{hints:^middle_width$}"), middle_style),
        Span::styled(right, chunk),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn error_label(state: ErrorState) -> &'static str {
    match state {
        ErrorState::NoError => "none",
        ErrorState::ConnectionTimeout => "timeout",
        ErrorState::Unknown => "unknown",
        ErrorState::Fatal => "fatal",
    }
}

fn error_style(state: ErrorState) -> Style {
    match state {
        ErrorState::NoError => Style::default().fg(TEXT_MUTED),
        ErrorState::ConnectionTimeout | ErrorState::Unknown => Style::default().fg(YELLOW),
        ErrorState::Fatal => Style::default().fg(RED),
    }
}
