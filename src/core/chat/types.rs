//! Refinement Chat Types
//!
//! Conversation turns, the session-owned id sequence, and the observable
//! event stream the chat engine publishes for a host UI.

use serde::{Deserialize, Serialize};

use crate::core::pipeline::HistoryEntry;

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Assistant,
    User,
}

/// A single turn in the refinement conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Unique within the session, monotonically assigned.
    pub id: u64,
    pub speaker: Speaker,
    pub text: String,
    /// Quick-answer options offered with an assistant question; cleared once
    /// the question is answered so it cannot be answered twice.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offered_options: Vec<String>,
    pub created_at: String,
}

impl ChatTurn {
    pub fn assistant(id: u64, text: impl Into<String>, offered_options: Vec<String>) -> Self {
        Self {
            id,
            speaker: Speaker::Assistant,
            text: text.into(),
            offered_options,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            speaker: Speaker::User,
            text: text.into(),
            offered_options: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Map this turn to the wire shape the service expects.
    pub fn to_history_entry(&self) -> HistoryEntry {
        match self.speaker {
            Speaker::Assistant => HistoryEntry::assistant(
                self.text.clone(),
                if self.offered_options.is_empty() {
                    None
                } else {
                    Some(self.offered_options.clone())
                },
            ),
            Speaker::User => HistoryEntry::user(self.text.clone()),
        }
    }
}

/// Session-owned id sequence for chat turns.
///
/// Injected into the engine rather than living in module-level state, so
/// concurrent sessions and tests stay isolated.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TurnIdGenerator {
    next: u64,
}

impl TurnIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Events the chat engine publishes for observers (typing reveal progress,
/// turns landing in history). Purely observational: dropping the receiver
/// never affects the protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    TypingStarted,
    /// Full text revealed so far.
    TypingDelta(String),
    TypingFinished,
    TurnAppended(u64),
    OptionsOffered(Vec<String>),
    RefinementComplete,
}
