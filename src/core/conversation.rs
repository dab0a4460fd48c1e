use std::sync::Arc;

use crate::core::message::Turn;

pub const GREETING: &str =
    "Hello! I am your ACT Companion. I'm here to listen and support you. How are you feeling today?";

/// Ordered log of visible turns.
///
/// The log is held behind an `Arc` so a snapshot is a cheap clone. Every
/// write produces a new log value (copy-on-write through [`Arc::make_mut`]),
/// which keeps previously taken snapshots intact and lets readers detect
/// changes with [`Arc::ptr_eq`] or [`ConversationStore::revision`].
#[derive(Debug, Clone)]
pub struct ConversationStore {
    turns: Arc<Vec<Turn>>,
    revision: u64,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// A store seeded with the greeting turn.
    pub fn new() -> Self {
        Self::with_turns(vec![Turn::model(GREETING)])
    }

    pub fn with_turns(turns: Vec<Turn>) -> Self {
        Self {
            turns: Arc::new(turns),
            revision: 0,
        }
    }

    pub fn append(&mut self, turn: Turn) {
        Arc::make_mut(&mut self.turns).push(turn);
        self.revision += 1;
    }

    /// Replaces the trailing turn with `turn`. Returns false when the store
    /// is empty.
    pub fn replace_last(&mut self, turn: Turn) -> bool {
        let turns = Arc::make_mut(&mut self.turns);
        match turns.last_mut() {
            Some(last) => {
                *last = turn;
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> Arc<Vec<Turn>> {
        Arc::clone(&self.turns)
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
