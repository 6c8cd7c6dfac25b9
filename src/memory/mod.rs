//! Per-conversation turn history.
//!
//! Histories are kept in process memory only and are lost on restart.

mod conversation;

pub use conversation::{ConversationId, ConversationStore, Role, Turn, DEFAULT_MAX_TURNS, MIN_MAX_TURNS};
