//! Nudge detection and affirmative-reply matching

use crate::db::TurnState;
use serde::Serialize;

/// Sentence the model ends a nudge with
pub const TRIGGER_PHRASE: &str = "Would you like to see some digital gold investment options?";

/// Canned reply when the user accepts a nudge
pub const CONFIRMATION_REPLY: &str = "Great! Here are the investment options available for you.";

/// Replies accepted as "yes" to a nudge, already normalized
pub const AFFIRMATIVE_REPLIES: &[&str] = &[
    "yes",
    "sure",
    "ok",
    "yep",
    "yes please",
    "yes sure",
    "go ahead",
];

/// Directive telling the client what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAction {
    /// Fetch and show `GET /invest/options`
    CallInvestmentOptions,
}

impl ClientAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientAction::CallInvestmentOptions => "call_investment_options",
        }
    }
}

/// Lowercase and trim. Inner whitespace is kept as is.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// The nudge rule: which responses are nudges and which replies accept one
#[derive(Debug, Clone)]
pub struct NudgePolicy {
    trigger_phrase: String,
    affirmatives: Vec<String>,
    confirmation_reply: String,
    action: ClientAction,
}

impl Default for NudgePolicy {
    fn default() -> Self {
        Self {
            trigger_phrase: TRIGGER_PHRASE.to_string(),
            affirmatives: AFFIRMATIVE_REPLIES.iter().map(|s| normalize(s)).collect(),
            confirmation_reply: CONFIRMATION_REPLY.to_string(),
            action: ClientAction::CallInvestmentOptions,
        }
    }
}

impl NudgePolicy {
    #[allow(dead_code)] // Used in tests
    pub fn trigger_phrase(&self) -> &str {
        &self.trigger_phrase
    }

    pub fn confirmation_reply(&self) -> &str {
        &self.confirmation_reply
    }

    pub fn action(&self) -> ClientAction {
        self.action
    }

    /// Does this model response end with the trigger phrase?
    pub fn is_nudge(&self, response: &str) -> bool {
        normalize(response).ends_with(&normalize(&self.trigger_phrase))
    }

    /// Is this question, once normalized, exactly one of the affirmative replies?
    pub fn is_affirmative(&self, question: &str) -> bool {
        let normalized = normalize(question);
        self.affirmatives.iter().any(|a| *a == normalized)
    }

    /// State to record alongside a model response
    pub fn classify(&self, response: &str) -> TurnState {
        if self.is_nudge(response) {
            TurnState::AwaitingConfirmation
        } else {
            TurnState::Answered
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_nudge_exact_and_suffix() {
        let policy = NudgePolicy::default();
        assert!(policy.is_nudge(TRIGGER_PHRASE));
        assert!(policy.is_nudge(&format!(
            "Gold has held value for centuries. {TRIGGER_PHRASE}\n\n"
        )));
        assert!(policy.is_nudge(
            "...WOULD YOU LIKE TO SEE SOME DIGITAL GOLD INVESTMENT OPTIONS?"
        ));
    }

    #[test]
    fn test_is_nudge_requires_trailing_position() {
        let policy = NudgePolicy::default();
        assert!(!policy.is_nudge(&format!("{TRIGGER_PHRASE} Let me know.")));
        assert!(!policy.is_nudge("Would you like to see some digital gold options?"));
        assert!(!policy.is_nudge(""));
    }

    #[test]
    fn test_is_affirmative_exact_set() {
        let policy = NudgePolicy::default();
        for reply in ["Yes", " YES ", "Sure", "ok", "yep", "Yes Please", "yes sure", "Go ahead\n"] {
            assert!(policy.is_affirmative(reply), "{reply:?} should be affirmative");
        }
        for reply in ["what about silver", "yes!", "yeah", "yes  please", "ok then", ""] {
            assert!(!policy.is_affirmative(reply), "{reply:?} should not be affirmative");
        }
    }

    #[test]
    fn test_classify() {
        let policy = NudgePolicy::default();
        assert_eq!(
            policy.classify(&format!("Consider gold. {TRIGGER_PHRASE}")),
            TurnState::AwaitingConfirmation
        );
        assert_eq!(policy.classify("I can't help you with this"), TurnState::Answered);
    }

    #[test]
    fn test_action_token() {
        assert_eq!(
            NudgePolicy::default().action().as_str(),
            "call_investment_options"
        );
        assert_eq!(
            serde_json::to_value(ClientAction::CallInvestmentOptions).unwrap(),
            "call_investment_options"
        );
    }
}
