//! Session context management
//!
//! A session holds the recent conversation turns for one caller so that
//! follow-up questions keep their context. The window is bounded: when it
//! overflows, the oldest turns are dropped first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::ConversationTurn;

/// Default maximum turns kept per session
const DEFAULT_MAX_TURNS: usize = 20;

/// Conversation context for one caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Session id
    pub id: Uuid,
    /// Caller-chosen session key
    pub session_key: String,
    /// Recent turns, oldest first
    pub turns: Vec<ConversationTurn>,
    /// Last activity timestamp
    pub last_activity: DateTime<Utc>,
    /// Maximum turns kept
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

impl SessionContext {
    /// Create a new session context
    #[must_use]
    pub fn new(session_key: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_key: session_key.into(),
            turns: Vec::new(),
            last_activity: Utc::now(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Create with a custom window size
    #[must_use]
    pub fn with_max_turns(session_key: impl Into<String>, max_turns: usize) -> Self {
        Self {
            max_turns,
            ..Self::new(session_key)
        }
    }

    /// Append a user query
    pub fn add_user_query(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::user_query(content));
    }

    /// Append an assistant answer
    pub fn add_assistant_text(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::assistant_text(content));
    }

    fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.last_activity = Utc::now();
        self.trim_if_needed();
    }

    /// The most recent `limit` turns, oldest first
    #[must_use]
    pub fn window(&self, limit: usize) -> &[ConversationTurn] {
        let start = self.turns.len().saturating_sub(limit);
        &self.turns[start..]
    }

    /// Number of retained turns
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// Drop oldest turns beyond the window bound
    fn trim_if_needed(&mut self) {
        if self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }
}
