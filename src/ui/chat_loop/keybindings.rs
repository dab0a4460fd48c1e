//! Keybinding handlers for the chat screen
//!
//! Keys are resolved against a [`KeyContext`] derived from the app and view:
//! the helpline dialog swallows everything but its own keys, the tag list
//! owns the arrows, and the input box gets the rest.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tui_textarea::Input as TAInput;

use crate::core::app::{App, AppAction};
use crate::ui::view::{ChatView, Focus};

const SCROLL_PAGE: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyContext {
    HelplineModal,
    TagList,
    Typing,
}

impl KeyContext {
    pub fn resolve(app: &App, view: &ChatView<'_>) -> Self {
        if app.helpline_visible {
            KeyContext::HelplineModal
        } else if view.focus == Focus::Tags {
            KeyContext::TagList
        } else {
            KeyContext::Typing
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyResult {
    /// Nothing changed.
    Ignored,
    /// View state changed; redraw.
    Handled,
    Dispatch(Vec<AppAction>),
    Exit,
}

pub fn handle_key(app: &App, view: &mut ChatView<'_>, key: KeyEvent) -> KeyResult {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyResult::Exit;
    }

    match KeyContext::resolve(app, view) {
        KeyContext::HelplineModal => handle_modal_key(key),
        context => {
            if let Some(result) = handle_global_key(view, key) {
                return result;
            }
            match context {
                KeyContext::TagList => handle_tag_list_key(view, key),
                _ => handle_typing_key(app, view, key),
            }
        }
    }
}

fn handle_modal_key(key: KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) => {
            KeyResult::Dispatch(vec![AppAction::DismissHelpline])
        }
        _ => KeyResult::Ignored,
    }
}

fn handle_global_key(view: &mut ChatView<'_>, key: KeyEvent) -> Option<KeyResult> {
    let result = match key.code {
        KeyCode::F(1) => KeyResult::Dispatch(vec![AppAction::ShowHelpline]),
        KeyCode::F(5) => KeyResult::Dispatch(vec![AppAction::ReloadCredentials]),
        KeyCode::Tab | KeyCode::BackTab => {
            view.toggle_focus();
            KeyResult::Handled
        }
        KeyCode::PageUp => {
            view.scroll_up(SCROLL_PAGE);
            KeyResult::Handled
        }
        KeyCode::PageDown => {
            view.scroll_down(SCROLL_PAGE);
            KeyResult::Handled
        }
        _ => return None,
    };
    Some(result)
}

fn handle_tag_list_key(view: &mut ChatView<'_>, key: KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view.move_tag_cursor(-1);
            KeyResult::Handled
        }
        KeyCode::Down | KeyCode::Char('j') => {
            view.move_tag_cursor(1);
            KeyResult::Handled
        }
        KeyCode::Char(' ') | KeyCode::Enter => match view.selected_tag() {
            Some(tag) => KeyResult::Dispatch(vec![AppAction::ToggleTag {
                id: tag.id.to_string(),
            }]),
            None => KeyResult::Ignored,
        },
        KeyCode::Esc => {
            view.focus = Focus::Input;
            KeyResult::Handled
        }
        _ => KeyResult::Ignored,
    }
}

fn handle_typing_key(app: &App, view: &mut ChatView<'_>, key: KeyEvent) -> KeyResult {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            view.textarea.insert_newline();
            KeyResult::Handled
        }
        KeyCode::Enter => {
            let message = view.input_text();
            if message.trim().is_empty() {
                return KeyResult::Ignored;
            }
            // A rejected submission keeps the draft so it can be sent later.
            if !app.is_loading() {
                view.clear_input();
                view.scroll_back = 0;
            }
            KeyResult::Dispatch(vec![AppAction::SubmitMessage { message }])
        }
        KeyCode::Esc => KeyResult::Dispatch(vec![AppAction::ClearStatus]),
        _ => {
            if view.textarea.input(TAInput::from(key)) {
                KeyResult::Handled
            } else {
                KeyResult::Ignored
            }
        }
    }
}
