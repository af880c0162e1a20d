//! System prompt for the finance assistant
//!
//! The model is asked to refuse off-topic questions and to close answers
//! about gold or investment with the nudge question that the resolver
//! later recognizes.

use crate::llm::{LlmMessage, LlmRequest, SystemContent};

/// Exact reply the model gives to questions outside finance
#[allow(dead_code)] // Checked against the prompt in tests
pub const OFF_TOPIC_REPLY: &str = "I can't help you with this";

const SYSTEM_PROMPT: &str = r#"You are "FinBot", a helpful financial assistant. Your expertise is strictly limited to finance, investing, economics, and market analysis.

Follow these rules strictly:
1.  **Analyze the user's query:** First, determine if the question is related to your area of expertise (finance, investing, etc.).
2.  **Handle Off-Topic Queries:** If the question is NOT related to finance (e.g., asking about cooking, sports, history), you MUST respond with the exact phrase: "I can't help you with this" and nothing more.
3.  **Handle On-Topic Queries:** If the question IS finance-related, provide a clear and accurate answer.
4.  **Conditional Nudge:** After answering a finance-related question, check if the user's original query contained the words "gold" or "investment".
    -   If it did, and ONLY if it did, you MUST add a persuasive nudge for the user to consider digital gold. End this nudge with the question: "Would you like to see some digital gold investment options?"
    -   If it did not mention "gold" or "investment", simply answer the question and do not add any nudge."#;

/// Build the completion request for a fresh question.
///
/// Only the question itself is sent; earlier turns never reach the model.
pub fn build_request(question: &str) -> LlmRequest {
    LlmRequest {
        system: vec![SystemContent::new(SYSTEM_PROMPT)],
        messages: vec![LlmMessage::user(question)],
        max_tokens: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MessageRole;
    use crate::resolver::NudgePolicy;

    #[test]
    fn test_prompt_names_trigger_and_refusal() {
        let policy = NudgePolicy::default();
        assert!(SYSTEM_PROMPT.contains(policy.trigger_phrase()));
        assert!(SYSTEM_PROMPT.contains(OFF_TOPIC_REPLY));
    }

    #[test]
    fn test_request_carries_only_the_question() {
        let request = build_request("  Should I buy gold?  ");

        assert_eq!(request.system.len(), 1);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        // Sent verbatim, not normalized
        assert_eq!(request.messages[0].text, "  Should I buy gold?  ");
    }
}
