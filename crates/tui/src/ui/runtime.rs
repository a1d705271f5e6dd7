//! Runtime: terminal lifecycle and the event loop of the demo host.
//!
//! Input is polled on the main thread; every key press is handed to
//! [`App::handle_key`] and the frame is redrawn only after something changed.
//! Handler errors end up in the log and the status line; they never tear the
//! terminal down.
use std::io::Stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::CrosstermBackend};
use tracing::{error, info};

use crate::app::App;
use crate::ui::{theme::ThemeRoles, view};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub fn run_app(mut app: App) -> Result<()> {
    let theme = ThemeRoles::default();
    let mut terminal = setup_terminal()?;
    info!("demo host started");
    let result = event_loop(&mut terminal, &mut app, &theme);
    // Restore the terminal even when the loop failed.
    cleanup_terminal(&mut terminal)?;
    info!("demo host stopped");
    result
}

fn event_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App, theme: &ThemeRoles) -> Result<()> {
    let mut needs_render = true;
    while !app.should_quit() {
        if needs_render {
            terminal.draw(|frame| view::draw(frame, app, theme))?;
            needs_render = false;
        }
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                if let Err(err) = app.handle_key(key) {
                    error!(error = ?err, "key handling failed");
                }
                needs_render = true;
            }
            Event::Resize(..) => needs_render = true,
            _ => {}
        }
    }
    Ok(())
}
