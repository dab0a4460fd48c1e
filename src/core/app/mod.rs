//! Conversation flow: ties user input, the model session and the visible
//! transcript together. UI layers drive it through [`AppAction`]s and carry
//! out the [`AppCommand`]s it returns.

mod actions;
pub mod bootstrap;


use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use actions::{apply_action, apply_actions, AppAction, AppCommand};
pub use bootstrap::{build_app, shutdown, AppOptions};

use crate::core::assembler::StreamingAssembler;
use crate::core::chat_stream::ChatStreamService;
use crate::core::config::Config;
use crate::core::conversation::ConversationStore;
use crate::core::mode::{ModeResolver, OperatingMode};
use crate::core::oauth::random_urlsafe;
use crate::core::prompt::SessionConfig;
use crate::core::safety::SafetyPolicy;
use crate::core::session::SessionAdapter;
use crate::core::transcript::TranscriptLogger;

pub const DEMO_MODE_REPLY: &str = "This is a simulated reply: ACT Companion is running in demo mode because no Gemini API key is configured, so nothing you type is sent to a model. Set GEMINI_API_KEY or run `act-companion auth` to talk with the live companion.";

pub struct App {
    pub session_config: SessionConfig,
    pub mode: OperatingMode,
    pub conversation: ConversationStore,
    pub assembler: StreamingAssembler,
    pub safety: SafetyPolicy,
    pub demo_delay: Duration,
    pub session_id: String,
    pub helpline_visible: bool,
    pub status: Option<String>,
    pub transcript: Option<Arc<TranscriptLogger>>,
    session: SessionAdapter,
    resolver: ModeResolver,
    current_stream_id: u64,
    stream_cancel_token: Option<CancellationToken>,
    in_flight: Option<InFlightTurn>,
}

/// What the open turn was sent with.
struct InFlightTurn {
    user_text: String,
    session_handle: Option<u64>,
}

pub struct AppInit {
    pub config: Config,
    pub session_config: SessionConfig,
    pub resolver: ModeResolver,
    pub transcript: Option<Arc<TranscriptLogger>>,
}

fn new_session_id() -> String {
    random_urlsafe(9).unwrap_or_else(|err| {
        error!("Falling back to a clock-based session id: {err}");
        chrono::Utc::now().timestamp_millis().to_string()
    })
}

impl App {
    pub fn new(init: AppInit) -> Self {
        let AppInit {
            config,
            session_config,
            resolver,
            transcript,
        } = init;

        let mut session =
            SessionAdapter::new(config.effective_base_url(), session_config.model.clone());
        let mode = resolver.resolve(&mut session, &session_config);
        info!(%mode, model = %session_config.model, "conversation ready");

        Self {
            session_config,
            mode,
            conversation: ConversationStore::new(),
            assembler: StreamingAssembler::new(),
            safety: config.safety_policy(),
            demo_delay: config.demo_delay(),
            session_id: new_session_id(),
            helpline_visible: false,
            status: None,
            transcript,
            session,
            resolver,
            current_stream_id: 0,
            stream_cancel_token: None,
            in_flight: None,
        }
    }

    /// A response is pending or streaming.
    pub fn is_loading(&self) -> bool {
        self.assembler.is_open()
    }

    pub fn session(&self) -> &SessionAdapter {
        &self.session
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        stream_id == self.current_stream_id
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        self.current_stream_id = self.current_stream_id.wrapping_add(1);
        self.stream_cancel_token = Some(token.clone());
        (token, self.current_stream_id)
    }

    fn finish_stream(&mut self) {
        self.stream_cancel_token = None;
    }

    /// Cancels any in-flight stream task. Used at shutdown.
    pub fn cancel_streams(&mut self) {
        if let Some(token) = self.stream_cancel_token.take() {
            token.cancel();
        }
    }

    /// Re-run mode resolution against the current tag selection.
    pub fn reconfigure(&mut self) {
        let previous = self.mode;
        self.mode = self.resolver.resolve(&mut self.session, &self.session_config);
        if previous != self.mode {
            info!(from = %previous, to = %self.mode, "operating mode changed");
        }
    }

    /// Re-read the API key from its source, then re-run mode resolution.
    pub fn reload_credentials(&mut self) {
        self.resolver.refresh();
        self.reconfigure();
    }

    /// Carry out commands produced by [`apply_action`].
    pub fn run_commands(&self, service: &ChatStreamService, commands: Vec<AppCommand>) {
        for command in commands {
            match command {
                AppCommand::SpawnStream(params) => service.spawn_stream(params),
                AppCommand::SpawnDemoReply {
                    reply,
                    delay,
                    cancel_token,
                    stream_id,
                } => service.spawn_demo_reply(reply, delay, cancel_token, stream_id),
                AppCommand::LogTurn {
                    role,
                    content,
                    session_id,
                } => {
                    if let Some(logger) = &self.transcript {
                        logger.log_in_background(role, content, session_id);
                    }
                }
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }
}
