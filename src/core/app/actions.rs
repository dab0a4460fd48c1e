use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::{App, InFlightTurn, DEMO_MODE_REPLY};
use crate::core::assembler::{TurnError, TurnState};
use crate::core::chat_stream::{StreamError, StreamMessage, StreamParams};
use crate::core::mode::OperatingMode;
use crate::core::transcript::LogRole;

#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    SubmitMessage { message: String },
    ToggleTag { id: String },
    ReloadCredentials,
    AppendResponseChunk { content: String, stream_id: u64 },
    StreamErrored { error: StreamError, stream_id: u64 },
    StreamCompleted { stream_id: u64 },
    ShowHelpline,
    DismissHelpline,
    SetStatus { message: String },
    ClearStatus,
}

impl AppAction {
    pub fn from_stream_message(message: StreamMessage, stream_id: u64) -> Self {
        match message {
            StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content, stream_id },
            StreamMessage::Error(error) => AppAction::StreamErrored { error, stream_id },
            StreamMessage::End => AppAction::StreamCompleted { stream_id },
        }
    }
}

#[derive(Debug)]
pub enum AppCommand {
    SpawnStream(StreamParams),
    SpawnDemoReply {
        reply: String,
        delay: Duration,
        cancel_token: CancellationToken,
        stream_id: u64,
    },
    LogTurn {
        role: LogRole,
        content: String,
        session_id: String,
    },
}

pub fn apply_actions(app: &mut App, actions: impl IntoIterator<Item = AppAction>) -> Vec<AppCommand> {
    actions
        .into_iter()
        .flat_map(|action| apply_action(app, action))
        .collect()
}

pub fn apply_action(app: &mut App, action: AppAction) -> Vec<AppCommand> {
    match action {
        AppAction::SubmitMessage { message } => submit_message(app, message),
        AppAction::ToggleTag { id } => {
            toggle_tag(app, &id);
            Vec::new()
        }
        AppAction::ReloadCredentials => {
            app.reload_credentials();
            app.set_status(format!("API key reloaded; running in {} mode", app.mode));
            Vec::new()
        }
        AppAction::AppendResponseChunk { content, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return Vec::new();
            }
            if let Err(err) = app.assembler.apply_increment(&mut app.conversation, &content) {
                debug!(stream_id, "dropping increment: {err}");
            }
            Vec::new()
        }
        AppAction::StreamErrored { error, stream_id } => {
            if !app.is_current_stream(stream_id) {
                return Vec::new();
            }
            error!(stream_id, "Error sending message: {error}");
            fail_turn(app)
        }
        AppAction::StreamCompleted { stream_id } => {
            if !app.is_current_stream(stream_id) {
                return Vec::new();
            }
            complete_turn(app)
        }
        AppAction::ShowHelpline => {
            app.helpline_visible = true;
            Vec::new()
        }
        AppAction::DismissHelpline => {
            app.helpline_visible = false;
            Vec::new()
        }
        AppAction::SetStatus { message } => {
            app.set_status(message);
            Vec::new()
        }
        AppAction::ClearStatus => {
            app.clear_status();
            Vec::new()
        }
    }
}

fn log_command(app: &App, role: LogRole, content: &str) -> Option<AppCommand> {
    app.transcript.as_ref()?;
    Some(AppCommand::LogTurn {
        role,
        content: content.to_string(),
        session_id: app.session_id.clone(),
    })
}

fn submit_message(app: &mut App, message: String) -> Vec<AppCommand> {
    if message.trim().is_empty() {
        return Vec::new();
    }
    let text = message.as_str();

    if let Err(err) = app.assembler.begin(&mut app.conversation, text) {
        if err == TurnError::TurnInProgress {
            app.set_status(err.to_string());
        }
        return Vec::new();
    }
    app.clear_status();

    if app.safety.should_escalate(app.mode, text) {
        warn!("sensitive content detected; showing helplines");
        app.helpline_visible = true;
    }

    let mut commands = Vec::new();
    commands.extend(log_command(app, LogRole::User, text));

    let (cancel_token, stream_id) = app.start_new_stream();
    app.in_flight = Some(InFlightTurn {
        user_text: text.to_string(),
        session_handle: app.session.handle().map(|handle| handle.id()),
    });

    match app.mode {
        OperatingMode::Demo => commands.push(AppCommand::SpawnDemoReply {
            reply: DEMO_MODE_REPLY.to_string(),
            delay: app.demo_delay,
            cancel_token,
            stream_id,
        }),
        OperatingMode::Live => match app.session.send(text, cancel_token, stream_id) {
            Ok(params) => commands.push(AppCommand::SpawnStream(params)),
            Err(err) => {
                error!("Error sending message: {err}");
                commands.extend(fail_turn(app));
            }
        },
    }
    commands
}

fn toggle_tag(app: &mut App, id: &str) {
    if !app.session_config.tags.toggle(id) {
        return;
    }
    debug!(tag = id, "behavior tag toggled");
    app.reconfigure();
}

fn complete_turn(app: &mut App) -> Vec<AppCommand> {
    let text = match app.assembler.complete(&mut app.conversation) {
        Ok(text) => text,
        Err(_) => return Vec::new(),
    };
    app.finish_stream();

    if let Some(turn) = app.in_flight.take() {
        let same_session = turn.session_handle.is_some()
            && turn.session_handle == app.session.handle().map(|handle| handle.id());
        if app.assembler.state() == Some(TurnState::Done) && same_session {
            app.session.record_exchange(&turn.user_text, &text);
        }
    }

    log_command(app, LogRole::Model, &text).into_iter().collect()
}

fn fail_turn(app: &mut App) -> Vec<AppCommand> {
    if app.assembler.fail(&mut app.conversation).is_err() {
        return Vec::new();
    }
    app.finish_stream();
    app.in_flight = None;

    let content = app
        .conversation
        .last()
        .map(|turn| turn.content.clone())
        .unwrap_or_default();
    log_command(app, LogRole::Model, &content).into_iter().collect()
}
