//! Event polling, dispatching, and UI rendering loop.
//!
//! Terminal input and stream increments arrive on two channels. Both are
//! turned into [`AppAction`]s, applied to the [`App`], and the resulting
//! [`AppCommand`](crate::core::app::AppCommand)s are carried out before the
//! next frame is drawn.

mod keybindings;
mod lifecycle;

use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc;
use tracing::debug;

use crate::core::app::{apply_actions, build_app, shutdown, App, AppAction, AppOptions};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::Config;
use crate::ui::renderer::ui;
use crate::ui::view::{ChatView, Focus};

use self::keybindings::{handle_key, KeyResult};
use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
}

/// Action to take in the main event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyLoopAction {
    Continue,
    Break,
}

fn spawn_event_reader(event_tx: mpsc::UnboundedSender<UiEvent>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Ok(true) = event::poll(Duration::from_millis(10)) {
                match event::read() {
                    Ok(ev) => {
                        if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => {
                        continue;
                    }
                }
            } else {
                tokio::task::yield_now().await;
            }
        }
    })
}

/// The first message plus everything already queued behind it.
fn drain_stream_actions(
    first: (StreamMessage, u64),
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Vec<AppAction> {
    std::iter::once(first)
        .chain(std::iter::from_fn(|| rx.try_recv().ok()))
        .map(|(message, stream_id)| AppAction::from_stream_message(message, stream_id))
        .collect()
}

fn dispatch(app: &mut App, stream_service: &ChatStreamService, actions: Vec<AppAction>) {
    let commands = apply_actions(app, actions);
    app.run_commands(stream_service, commands);
}

fn handle_ui_event(
    app: &mut App,
    view: &mut ChatView<'_>,
    stream_service: &ChatStreamService,
    event: UiEvent,
) -> KeyLoopAction {
    match event {
        UiEvent::Crossterm(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            match handle_key(app, view, key) {
                KeyResult::Exit => return KeyLoopAction::Break,
                KeyResult::Dispatch(actions) => dispatch(app, stream_service, actions),
                KeyResult::Handled | KeyResult::Ignored => {}
            }
        }
        UiEvent::Crossterm(Event::Paste(text)) => {
            if !app.helpline_visible && view.focus == Focus::Input {
                view.textarea.insert_str(text.replace('\r', ""));
            }
        }
        UiEvent::Crossterm(_) => {}
    }
    KeyLoopAction::Continue
}

async fn run_event_loop(terminal: &mut ChatTerminal, app: &mut App) -> Result<(), Box<dyn Error>> {
    let (stream_service, mut rx) = ChatStreamService::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();
    let event_reader_handle = spawn_event_reader(event_tx);
    let mut view = ChatView::new();

    let result = loop {
        if let Err(err) = terminal.draw(|f| ui(f, app, &mut view)) {
            break Err(err.into());
        }

        tokio::select! {
            Some(event) = event_rx.recv() => {
                if handle_ui_event(app, &mut view, &stream_service, event) == KeyLoopAction::Break {
                    break Ok(());
                }
            }
            Some(first) = rx.recv() => {
                let actions = drain_stream_actions(first, &mut rx);
                dispatch(app, &stream_service, actions);
            }
            else => break Ok(()),
        }
    };

    event_reader_handle.abort();
    result
}

pub async fn run_chat(options: AppOptions) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let mut app = build_app(&options, &config).await?;

    let mut terminal = setup_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app).await;
    let restored = restore_terminal(&mut terminal);

    debug!("chat loop finished");
    shutdown(&mut app, &config).await;
    result?;
    restored
}
