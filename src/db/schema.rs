//! Database schema and types

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS conversation_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    user_prompt TEXT NOT NULL,
    bot_response TEXT,
    state TEXT NOT NULL DEFAULT 'pending',
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversation_logs_user ON conversation_logs(user_id, id DESC);
";

/// Adds the state column to a table created without it. New rows still
/// pass their state explicitly.
pub const MIGRATION_ADD_STATE: &str =
    "ALTER TABLE conversation_logs ADD COLUMN state TEXT NOT NULL DEFAULT 'pending'";

/// Store-assigned turn identifier. Monotonic within a database.
pub type TurnId = i64;

/// Where the conversation stands after a turn.
///
/// `Pending` turns have no response yet. `AwaitingConfirmation` marks a
/// response that ended in the nudge trigger phrase, so the user's next
/// message is checked against the affirmative replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Pending,
    Answered,
    AwaitingConfirmation,
    Confirmed,
}

impl TurnState {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnState::Pending => "pending",
            TurnState::Answered => "answered",
            TurnState::AwaitingConfirmation => "awaiting_confirmation",
            TurnState::Confirmed => "confirmed",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTurnState(pub String);

impl fmt::Display for UnknownTurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown turn state: {}", self.0)
    }
}

impl std::error::Error for UnknownTurnState {}

impl FromStr for TurnState {
    type Err = UnknownTurnState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TurnState::Pending),
            "answered" => Ok(TurnState::Answered),
            "awaiting_confirmation" => Ok(TurnState::AwaitingConfirmation),
            "confirmed" => Ok(TurnState::Confirmed),
            other => Err(UnknownTurnState(other.to_string())),
        }
    }
}

/// One logged prompt/response pair for a user
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: TurnId,
    pub user_id: String,
    pub prompt: String,
    pub response: Option<String>,
    pub state: TurnState,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// True when the user's next message should be read as a reply to a nudge.
    ///
    /// A turn without a response never qualifies, whatever its state says.
    pub fn awaits_confirmation(&self) -> bool {
        self.response.is_some() && self.state == TurnState::AwaitingConfirmation
    }
}
