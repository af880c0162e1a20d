//! Mock implementations for testing
//!
//! These mocks let the resolver and the HTTP layer run without a database
//! file or a network.

use super::traits::TurnStore;
use crate::db::{DbError, DbResult, Turn, TurnId, TurnState};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Mock LLM client that returns queued responses
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    model_id: String,
    /// When set, each call waits for a permit before answering
    gate: Option<Arc<Notify>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            model_id: model_id.into(),
            gate: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Hold every call until `gate.notify_one()`
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Queue a successful text response
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// ============================================================================
// In-Memory Turn Store
// ============================================================================

/// Turn log held in a `Vec`, ids assigned from 1
#[derive(Default)]
pub struct InMemoryTurnStore {
    turns: Mutex<Vec<Turn>>,
}

impl InMemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a turn as-is, for setting up history
    pub fn seed(&self, user_id: &str, prompt: &str, response: Option<&str>, state: TurnState) {
        let mut turns = self.turns.lock().unwrap();
        let id = next_id(&turns);
        turns.push(Turn {
            id,
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            response: response.map(String::from),
            state,
            created_at: Utc::now(),
        });
    }

    /// All turns for a user, oldest first
    pub fn turns_for(&self, user_id: &str) -> Vec<Turn> {
        self.turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

fn next_id(turns: &[Turn]) -> TurnId {
    #[allow(clippy::cast_possible_wrap)]
    let id = turns.len() as TurnId + 1;
    id
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn append_turn(&self, user_id: &str, prompt: &str) -> DbResult<TurnId> {
        let mut turns = self.turns.lock().unwrap();
        let id = next_id(&turns);
        turns.push(Turn {
            id,
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            response: None,
            state: TurnState::Pending,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn attach_response(
        &self,
        id: TurnId,
        response: &str,
        state: TurnState,
    ) -> DbResult<()> {
        let mut turns = self.turns.lock().unwrap();
        let turn = turns
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(DbError::TurnNotFound(id))?;
        if turn.response.is_some() {
            return Err(DbError::TurnAlreadyAnswered(id));
        }
        turn.response = Some(response.to_string());
        turn.state = state;
        Ok(())
    }

    async fn record_exchange(
        &self,
        user_id: &str,
        prompt: &str,
        response: &str,
        state: TurnState,
    ) -> DbResult<Turn> {
        let mut turns = self.turns.lock().unwrap();
        let turn = Turn {
            id: next_id(&turns),
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            response: Some(response.to_string()),
            state,
            created_at: Utc::now(),
        };
        turns.push(turn.clone());
        Ok(turn)
    }

    async fn latest_turn(&self, user_id: &str) -> DbResult<Option<Turn>> {
        Ok(self
            .turns
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.user_id == user_id)
            .max_by_key(|t| t.id)
            .cloned())
    }
}
