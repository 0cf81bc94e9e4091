//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use ticketdesk_core::forms::FormFields;
use ticketdesk_core::Route;

use crate::app::{App, AppState};

/// What a key did to a form
#[derive(Debug, PartialEq, Eq)]
enum FormKey {
    Submit,
    Back,
    Handled,
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
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

    // Handle logout confirmation
    if matches!(app.state, AppState::ConfirmingLogout) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Normal;
                app.logout();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    match app.route {
        Route::Login => handle_login_input(app, key).await,
        Route::Register => handle_register_input(app, key).await,
        Route::ResetPassword { .. } => handle_reset_input(app, key).await,
        Route::Dashboard => handle_dashboard_input(app, key).await,
        Route::Unauthorized => handle_unauthorized_input(app, key).await,
    }
}

/// Shared field editing and focus movement
fn handle_form_key(fields: &mut FormFields, key: KeyEvent) -> FormKey {
    match key.code {
        KeyCode::Esc => return FormKey::Back,
        KeyCode::Tab | KeyCode::Down => fields.focus_next(),
        KeyCode::BackTab | KeyCode::Up => fields.focus_prev(),
        KeyCode::Enter => {
            // Enter on the last field or the button submits
            if fields.is_submit_focused() || fields.focus() + 1 == fields.fields().len() {
                return FormKey::Submit;
            }
            fields.focus_next();
        }
        KeyCode::Backspace => fields.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            fields.type_char(c);
        }
        _ => {}
    }
    FormKey::Handled
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('n') => app.open_register(),
            KeyCode::Char('r') => app.open_reset(),
            _ => {}
        }
        return Ok(false);
    }

    match handle_form_key(&mut app.login_form.fields, key) {
        FormKey::Submit => app.submit_login().await,
        FormKey::Back => app.state = AppState::ConfirmingQuit,
        FormKey::Handled => {}
    }
    Ok(false)
}

async fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match handle_form_key(&mut app.register_form.fields, key) {
        FormKey::Submit => app.submit_registration().await,
        FormKey::Back => app.back_to_login(),
        FormKey::Handled => {}
    }
    Ok(false)
}

async fn handle_reset_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match handle_form_key(&mut app.reset_form.fields, key) {
        FormKey::Submit => app.submit_reset().await,
        FormKey::Back => app.back_to_login(),
        FormKey::Handled => {}
    }
    Ok(false)
}

async fn handle_dashboard_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,
        KeyCode::Char('l') => app.state = AppState::ConfirmingLogout,
        KeyCode::Char('u') => app.refresh_dashboard().await,
        KeyCode::Char('r') => app.cycle_preview_role(),
        KeyCode::Up | KeyCode::Char('k') => app.menu_up(),
        KeyCode::Down | KeyCode::Char('j') => app.menu_down(),
        KeyCode::Enter => app.activate_menu_item().await,
        _ => {}
    }
    Ok(false)
}

async fn handle_unauthorized_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.go(Route::Dashboard).await,
        KeyCode::Char('l') => app.state = AppState::ConfirmingLogout,
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ticketdesk_core::forms::LoginForm;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_fills_focused_field() {
        let mut form = LoginForm::new("", "");
        for c in "jdoe".chars() {
            handle_form_key(&mut form.fields, press(KeyCode::Char(c)));
        }
        assert_eq!(form.username(), "jdoe");

        handle_form_key(&mut form.fields, press(KeyCode::Backspace));
        assert_eq!(form.username(), "jdo");
    }

    #[test]
    fn test_enter_advances_then_submits() {
        let mut form = LoginForm::new("", "");
        assert_eq!(handle_form_key(&mut form.fields, press(KeyCode::Enter)), FormKey::Handled);
        assert_eq!(form.fields.focus(), 1);
        assert_eq!(handle_form_key(&mut form.fields, press(KeyCode::Enter)), FormKey::Submit);
    }

    #[test]
    fn test_control_chars_are_not_typed() {
        let mut form = LoginForm::new("", "");
        let key = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        handle_form_key(&mut form.fields, key);
        assert_eq!(form.username(), "");
    }

    #[test]
    fn test_esc_goes_back() {
        let mut form = LoginForm::new("", "");
        assert_eq!(handle_form_key(&mut form.fields, press(KeyCode::Esc)), FormKey::Back);
    }
}
