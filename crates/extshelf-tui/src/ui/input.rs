//! Keyboard input handling for the TUI.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use extshelf_core::models::Filter;

use crate::app::{App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Quitting => return Ok(true),
        AppState::Normal => {}
    }

    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        KeyCode::Char('1') => app.set_filter(Filter::All),
        KeyCode::Char('2') => app.set_filter(Filter::Active),
        KeyCode::Char('3') => app.set_filter(Filter::Inactive),

        KeyCode::Down | KeyCode::Right | KeyCode::Char('j') | KeyCode::Char('l') => app.select_next(),
        KeyCode::Up | KeyCode::Left | KeyCode::Char('k') | KeyCode::Char('h') => app.select_prev(),

        KeyCode::Char('d') | KeyCode::Delete => app.remove_selected(),
        KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected(),

        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('r') => app.reload(),
        KeyCode::Char('o') => app.toggle_online(),
        _ => {}
    }

    Ok(false)
}
