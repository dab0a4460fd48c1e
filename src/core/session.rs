use std::error::Error;
use std::fmt;

use reqwest::header::HeaderValue;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::api::{Content, GenerateContentRequest, GenerationConfig};
use crate::core::chat_stream::{StreamError, StreamParams};
use crate::core::message::Role;
use crate::core::prompt::SessionConfig;

/// Session creation failed; callers fall back to demo mode.
#[derive(Debug)]
pub enum InitializationError {
    MissingCredential,
    MalformedCredential(String),
    Client(reqwest::Error),
}

impl fmt::Display for InitializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationError::MissingCredential => write!(f, "No API key configured"),
            InitializationError::MalformedCredential(reason) => {
                write!(f, "API key is malformed: {reason}")
            }
            InitializationError::Client(err) => write!(f, "Failed to build HTTP client: {err}"),
        }
    }
}

impl Error for InitializationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InitializationError::Client(err) => Some(err),
            _ => None,
        }
    }
}

pub fn validate_credential(api_key: &str) -> Result<(), InitializationError> {
    if api_key.trim().is_empty() {
        return Err(InitializationError::MissingCredential);
    }
    if api_key.chars().any(char::is_whitespace) {
        return Err(InitializationError::MalformedCredential(
            "contains whitespace".to_string(),
        ));
    }
    HeaderValue::from_str(api_key).map_err(|_| {
        InitializationError::MalformedCredential("not a valid header value".to_string())
    })?;
    Ok(())
}

/// A live conversation context. Bound at creation to one instruction and
/// temperature; never mutated except for the chat history it carries.
#[derive(Debug)]
pub struct SessionHandle {
    id: u64,
    model: String,
    instruction: String,
    temperature: f32,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
    history: Vec<Content>,
}

impl SessionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    fn matches(&self, config: &SessionConfig, instruction: &str) -> bool {
        self.model == config.model
            && self.temperature == config.temperature
            && self.instruction == instruction
    }

    /// The request body for one turn: prior history plus the new user text.
    pub fn request_for(&self, text: &str) -> GenerateContentRequest {
        let mut contents = self.history.clone();
        contents.push(Content::text(Some(Role::User.as_str()), text));
        GenerateContentRequest {
            system_instruction: Content::text(None, self.instruction.clone()),
            contents,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        }
    }

    pub fn stream_params(
        &self,
        text: &str,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) -> StreamParams {
        StreamParams {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            request: self.request_for(text),
            cancel_token,
            stream_id,
        }
    }
}

/// Owns the single session handle and replaces it whenever the composed
/// instruction changes.
#[derive(Debug)]
pub struct SessionAdapter {
    base_url: String,
    model: String,
    api_key: Option<String>,
    handle: Option<SessionHandle>,
    created: u64,
}

impl SessionAdapter {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            api_key: None,
            handle: None,
            created: 0,
        }
    }

    /// Replace the credential. A different credential invalidates the handle.
    pub fn set_credential(&mut self, api_key: Option<String>) {
        if self.api_key != api_key {
            self.handle = None;
        }
        self.api_key = api_key;
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    pub fn has_session(&self) -> bool {
        self.handle.is_some()
    }

    pub fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(session = handle.id, "session discarded");
        }
    }

    pub fn create(
        &self,
        instruction: String,
        temperature: f32,
    ) -> Result<SessionHandle, InitializationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(InitializationError::MissingCredential)?;
        validate_credential(api_key)?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(InitializationError::Client)?;

        Ok(SessionHandle {
            id: self.created + 1,
            model: self.model.clone(),
            instruction,
            temperature,
            api_key: api_key.to_string(),
            base_url: self.base_url.clone(),
            client,
            history: Vec::new(),
        })
    }

    /// Bring the handle in line with `config`. Returns `Ok(true)` when a new
    /// handle was installed and `Ok(false)` when the current one already
    /// matches. On failure the handle is cleared.
    pub fn reconfigure(&mut self, config: &SessionConfig) -> Result<bool, InitializationError> {
        let instruction = config.instruction();
        if let Some(handle) = &self.handle {
            if handle.matches(config, &instruction) {
                return Ok(false);
            }
        }

        self.model = config.model.clone();
        match self.create(instruction, config.temperature) {
            Ok(handle) => {
                self.created = handle.id;
                info!(
                    session = handle.id,
                    model = %handle.model,
                    temperature = handle.temperature,
                    "session created"
                );
                self.handle = Some(handle);
                Ok(true)
            }
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Start a turn against the current handle.
    pub fn send(
        &self,
        text: &str,
        cancel_token: CancellationToken,
        stream_id: u64,
    ) -> Result<StreamParams, StreamError> {
        let handle = self.handle.as_ref().ok_or(StreamError::NoSession)?;
        Ok(handle.stream_params(text, cancel_token, stream_id))
    }

    /// Fold a completed exchange into the handle's history.
    pub fn record_exchange(&mut self, user_text: &str, model_text: &str) {
        if let Some(handle) = self.handle.as_mut() {
            handle
                .history
                .push(Content::text(Some(Role::User.as_str()), user_text));
            handle
                .history
                .push(Content::text(Some(Role::Model.as_str()), model_text));
        }
    }
}
