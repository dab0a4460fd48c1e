//! Folds a model response stream into the trailing turn of the conversation.

use std::error::Error;
use std::fmt;

use crate::core::conversation::ConversationStore;
use crate::core::message::Turn;

pub const STREAM_FAILURE_MESSAGE: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Pending,
    Streaming,
    Done,
    Failed,
}

impl TurnState {
    pub fn is_open(self) -> bool {
        matches!(self, TurnState::Pending | TurnState::Streaming)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnError {
    /// A previous turn is still pending or streaming.
    TurnInProgress,
    /// An increment or completion arrived with no open turn.
    NoOpenTurn,
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::TurnInProgress => {
                write!(f, "Please wait for the current response to finish")
            }
            TurnError::NoOpenTurn => write!(f, "No response is in progress"),
        }
    }
}

impl Error for TurnError {}

/// State machine for the single in-flight model turn.
///
/// The text shown so far is tracked in `accumulated`, never read back from
/// the store, so each increment extends exactly what was received.
#[derive(Debug)]
pub struct StreamingAssembler {
    state: Option<TurnState>,
    accumulated: String,
}

impl Default for StreamingAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamingAssembler {
    pub fn new() -> Self {
        Self {
            state: None,
            accumulated: String::new(),
        }
    }

    /// State of the most recent turn, if any turn has started.
    pub fn state(&self) -> Option<TurnState> {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_some_and(TurnState::is_open)
    }

    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Append the user turn and the pending model placeholder.
    pub fn begin(&mut self, store: &mut ConversationStore, user_text: &str) -> Result<(), TurnError> {
        if self.is_open() {
            return Err(TurnError::TurnInProgress);
        }
        store.append(Turn::user(user_text));
        store.append(Turn::pending());
        self.accumulated.clear();
        self.state = Some(TurnState::Pending);
        Ok(())
    }

    pub fn apply_increment(
        &mut self,
        store: &mut ConversationStore,
        increment: &str,
    ) -> Result<(), TurnError> {
        if !self.is_open() {
            return Err(TurnError::NoOpenTurn);
        }
        self.accumulated.push_str(increment);
        store.replace_last(Turn::model(self.accumulated.clone()));
        self.state = Some(TurnState::Streaming);
        Ok(())
    }

    /// Close the turn and return its final text. A stream that ended
    /// without any text is treated as a failure.
    pub fn complete(&mut self, store: &mut ConversationStore) -> Result<String, TurnError> {
        if !self.is_open() {
            return Err(TurnError::NoOpenTurn);
        }
        if self.accumulated.is_empty() {
            self.fail(store)?;
            return Ok(STREAM_FAILURE_MESSAGE.to_string());
        }
        self.state = Some(TurnState::Done);
        Ok(std::mem::take(&mut self.accumulated))
    }

    /// Replace the turn's content with the failure message and close it.
    pub fn fail(&mut self, store: &mut ConversationStore) -> Result<(), TurnError> {
        if !self.is_open() {
            return Err(TurnError::NoOpenTurn);
        }
        self.accumulated.clear();
        store.replace_last(Turn::model(STREAM_FAILURE_MESSAGE));
        self.state = Some(TurnState::Failed);
        Ok(())
    }
}
