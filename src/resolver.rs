//! Turn resolution
//!
//! Decides for each incoming question whether it answers a pending nudge
//! (continuation) or is a new question for the model (fresh), then writes
//! the turn and builds the reply.
//!
//! The conversation state lives on the latest stored turn: a turn recorded
//! as `AwaitingConfirmation` means the next message is first checked
//! against the affirmative replies.

mod locks;
mod nudge;
#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;
mod traits;

pub use nudge::{ClientAction, NudgePolicy};
pub use traits::TurnStore;

use crate::db::{DbError, Turn, TurnId, TurnState};
use crate::llm::{LlmError, LlmService};
use crate::system_prompt::build_request;
use locks::UserLocks;
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to the caller. Nothing is retried.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{0}")]
    Store(#[from] DbError),
    #[error("{0}")]
    Upstream(#[from] LlmError),
}

/// Which path a question takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// The question accepts a pending nudge; answered without the model
    Continuation,
    /// The question goes to the model
    Fresh,
}

/// Reply to one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub answer: String,
    pub action: Option<ClientAction>,
    pub turn_id: TurnId,
    pub mode: ResolveMode,
}

/// Pick the path for `question` given the user's latest turn.
///
/// A declined or misunderstood nudge falls through to fresh.
pub fn decide(policy: &NudgePolicy, latest: Option<&Turn>, question: &str) -> ResolveMode {
    match latest {
        Some(turn) if turn.awaits_confirmation() && policy.is_affirmative(question) => {
            ResolveMode::Continuation
        }
        _ => ResolveMode::Fresh,
    }
}

pub struct TurnResolver {
    store: Arc<dyn TurnStore>,
    llm: Arc<dyn LlmService>,
    policy: NudgePolicy,
    locks: UserLocks,
}

impl TurnResolver {
    pub fn new(store: Arc<dyn TurnStore>, llm: Arc<dyn LlmService>, policy: NudgePolicy) -> Self {
        Self {
            store,
            llm,
            policy,
            locks: UserLocks::default(),
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    /// Resolve one question from `user_id`.
    ///
    /// Holds the user's lock from reading the latest turn until the new turn
    /// is written, so concurrent requests from one user are applied in order.
    pub async fn resolve(&self, user_id: &str, question: &str) -> Result<Resolution, ResolveError> {
        let _guard = self.locks.acquire(user_id).await;

        let latest = self.store.latest_turn(user_id).await?;
        let mode = decide(&self.policy, latest.as_ref(), question);

        if latest.as_ref().is_some_and(Turn::awaits_confirmation) && mode == ResolveMode::Fresh {
            tracing::debug!(user_id = %user_id, "Nudge not accepted, answering as a new question");
        }

        match mode {
            ResolveMode::Continuation => self.confirm_nudge(user_id, question).await,
            ResolveMode::Fresh => self.answer_fresh(user_id, question).await,
        }
    }

    async fn confirm_nudge(&self, user_id: &str, question: &str) -> Result<Resolution, ResolveError> {
        let turn = self
            .store
            .record_exchange(
                user_id,
                question,
                self.policy.confirmation_reply(),
                TurnState::Confirmed,
            )
            .await?;

        tracing::info!(
            user_id = %user_id,
            turn_id = turn.id,
            action = self.policy.action().as_str(),
            "Nudge accepted"
        );

        Ok(Resolution {
            answer: self.policy.confirmation_reply().to_string(),
            action: Some(self.policy.action()),
            turn_id: turn.id,
            mode: ResolveMode::Continuation,
        })
    }

    async fn answer_fresh(&self, user_id: &str, question: &str) -> Result<Resolution, ResolveError> {
        // Written before the model call; stays pending if the call fails
        let turn_id = self.store.append_turn(user_id, question).await?;

        let response = match self.llm.complete(&build_request(question)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    turn_id,
                    error = %e,
                    "Model call failed, turn left without response"
                );
                return Err(e.into());
            }
        };

        let state = self.policy.classify(&response.text);
        self.store
            .attach_response(turn_id, &response.text, state)
            .await?;

        tracing::debug!(user_id = %user_id, turn_id, state = %state, "Answered question");

        Ok(Resolution {
            answer: response.text,
            action: None,
            turn_id,
            mode: ResolveMode::Fresh,
        })
    }
}
