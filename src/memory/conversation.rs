//! Bounded, concurrency-safe conversation store.

use std::collections::VecDeque;
use std::fmt;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

/// Opaque identifier grouping the turns of one conversation.
pub type ConversationId = Uuid;

/// Turns kept per conversation when no bound is configured.
pub const DEFAULT_MAX_TURNS: usize = 8;

/// Smallest accepted bound: one user turn plus one assistant turn.
pub const MIN_MAX_TURNS: usize = 2;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("User"),
            Role::Assistant => f.write_str("Assistant"),
        }
    }
}

/// One message in a conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Holds the bounded turn history of every conversation.
///
/// Each history lives in its own map entry; appends take the entry's shard
/// lock for the whole read-modify-write, so concurrent appends to one
/// conversation never lose a turn while unrelated conversations mostly land
/// on different shards.
#[derive(Debug)]
pub struct ConversationStore {
    histories: DashMap<ConversationId, VecDeque<Turn>>,
    max_turns: usize,
}

impl ConversationStore {
    /// Create a store keeping at most `max_turns` turns per conversation.
    ///
    /// Bounds below [`MIN_MAX_TURNS`] are raised to it.
    pub fn new(max_turns: usize) -> Self {
        Self {
            histories: DashMap::new(),
            max_turns: max_turns.max(MIN_MAX_TURNS),
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Record a user turn.
    pub fn add_user(&self, id: ConversationId, text: impl Into<String>) {
        self.push(id, Turn::new(Role::User, text));
    }

    /// Record an assistant turn.
    pub fn add_assistant(&self, id: ConversationId, text: impl Into<String>) {
        self.push(id, Turn::new(Role::Assistant, text));
    }

    fn push(&self, id: ConversationId, turn: Turn) {
        let mut turns = self.histories.entry(id).or_default();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    /// Render the history as `Role: text` lines, oldest first.
    ///
    /// Unknown conversations render as an empty string.
    pub fn render_history(&self, id: ConversationId) -> String {
        let Some(turns) = self.histories.get(&id) else {
            return String::new();
        };
        let skip = turns.len().saturating_sub(self.max_turns);
        turns
            .iter()
            .skip(skip)
            .map(|t| format!("{}: {}", t.role, t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Snapshot of the stored turns, oldest first.
    pub fn turns(&self, id: ConversationId) -> Vec<Turn> {
        self.histories
            .get(&id)
            .map(|turns| turns.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The most recent turn, if any.
    pub fn last_turn(&self, id: ConversationId) -> Option<Turn> {
        self.histories
            .get(&id)
            .and_then(|turns| turns.back().cloned())
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}
