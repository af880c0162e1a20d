//! Storage abstraction used by the resolver
//!
//! Lets the resolver run against `SQLite` in production and an in-memory
//! log in tests.

use crate::db::{Database, DbResult, Turn, TurnId, TurnState};
use async_trait::async_trait;

/// Append-only log of conversation turns
#[async_trait]
pub trait TurnStore: Send + Sync {
    /// Append a turn with no response yet
    async fn append_turn(&self, user_id: &str, prompt: &str) -> DbResult<TurnId>;

    /// Attach the response to a pending turn, at most once
    async fn attach_response(&self, id: TurnId, response: &str, state: TurnState)
        -> DbResult<()>;

    /// Append a turn with prompt and response set together
    async fn record_exchange(
        &self,
        user_id: &str,
        prompt: &str,
        response: &str,
        state: TurnState,
    ) -> DbResult<Turn>;

    /// Highest-id turn for the user
    async fn latest_turn(&self, user_id: &str) -> DbResult<Option<Turn>>;
}

#[async_trait]
impl TurnStore for Database {
    async fn append_turn(&self, user_id: &str, prompt: &str) -> DbResult<TurnId> {
        Database::append_turn(self, user_id, prompt)
    }

    async fn attach_response(
        &self,
        id: TurnId,
        response: &str,
        state: TurnState,
    ) -> DbResult<()> {
        Database::attach_response(self, id, response, state)
    }

    async fn record_exchange(
        &self,
        user_id: &str,
        prompt: &str,
        response: &str,
        state: TurnState,
    ) -> DbResult<Turn> {
        Database::record_exchange(self, user_id, prompt, response, state)
    }

    async fn latest_turn(&self, user_id: &str) -> DbResult<Option<Turn>> {
        Database::latest_turn(self, user_id)
    }
}
