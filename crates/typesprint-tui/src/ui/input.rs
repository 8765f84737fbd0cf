//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use typesprint_core::auth::GateDecision;

use crate::app::{can_add_password_char, can_add_username_char, App, AppState, LoginFocus};
use crate::nav::Route;

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::F(1)) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    if key.code == KeyCode::F(1) {
        app.state = AppState::ShowingHelp;
        return Ok(false);
    }

    if is_ctrl(&key, 'q') {
        app.state = AppState::Quitting;
        return Ok(true);
    }

    match app.nav.current() {
        Route::Login => handle_login_input(app, key).await,
        route => {
            // Protected screens take no input until the gate allows rendering
            if app.gate() != GateDecision::Render {
                return Ok(false);
            }
            if route == Route::History {
                handle_history_input(app, key).await;
            } else {
                handle_typing_input(app, key).await;
            }
            Ok(false)
        }
    }
}

fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Quit if on login screen
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Username,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Username => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Username,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Username => {
                app.login_focus = LoginFocus::Password;
            }
            LoginFocus::Password | LoginFocus::Button => {
                // On failure login_error is set; success shows up on the auth channel
                let _ = app.attempt_login().await;
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Username => {
                app.login_username.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Username => {
                if can_add_username_char(app.login_username.chars().count(), c) {
                    app.login_username.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

async fn handle_typing_input(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('n') => app.new_test().await,
            KeyCode::Char('t') => app.toggle_timer_mode(),
            KeyCode::Char('s') if app.can_retry_submission() => app.retry_submission().await,
            KeyCode::Char('r') => app.show_history().await,
            KeyCode::Char('l') => app.logout().await,
            KeyCode::Char('z') => app.restart_test(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.end_test().await,
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) => app.type_char(c).await,
        _ => {}
    }
}

async fn handle_history_input(app: &mut App, key: KeyEvent) {
    if is_ctrl(&key, 'l') {
        app.logout().await;
        return;
    }

    match key.code {
        KeyCode::Esc | KeyCode::Backspace => {
            if !app.nav.back() {
                app.nav.replace(Route::Typing);
            }
        }
        KeyCode::Up | KeyCode::Char('k') => app.select_previous_result(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next_result(),
        KeyCode::Char('r') => app.load_history().await,
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ctrl() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(is_ctrl(&key, 'q'));
        assert!(!is_ctrl(&key, 'l'));

        let plain = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!is_ctrl(&plain, 'q'));
    }
}
