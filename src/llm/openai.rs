//! `OpenAI`-compatible provider implementation (`OpenAI`, `OpenRouter`)

use super::types::{LlmMessage, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default model served through `OpenRouter`
pub const DEFAULT_OPENAI_MODEL: &str = "openai/gpt-oss-20b:free";

/// Default base URL for the `OpenAI`-compatible API
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// OpenAI-compatible service implementation
pub struct OpenAIService {
    client: Client,
    api_key: String,
    model: String,
    url: String,
}

impl OpenAIService {
    pub fn new(
        api_key: String,
        model: impl Into<String>,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model: model.into(),
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }

    fn translate_request(&self, request: &LlmRequest) -> OpenAIRequest {
        let mut messages = Vec::new();

        // System prompt goes first
        if let Some(system_text) = request.system_text() {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: Some(system_text),
            });
        }

        messages.extend(request.messages.iter().map(Self::translate_message));

        OpenAIRequest {
            model: self.model.clone(),
            messages,
            max_tokens: request.max_tokens,
            stream: false,
        }
    }

    fn translate_message(msg: &LlmMessage) -> OpenAIMessage {
        let role = match msg.role {
            MessageRole::User => "user",
        };
        OpenAIMessage {
            role: role.to_string(),
            content: Some(msg.text.clone()),
        }
    }

    fn normalize_response(resp: OpenAIResponse) -> Result<LlmResponse, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No choices in response"))?;

        let text = choice
            .message
            .content
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LlmError::unknown("Response contained no text"))?;

        let usage = resp.usage.map_or_else(Usage::default, |u| Usage {
            input_tokens: u64::from(u.prompt_tokens),
            output_tokens: u64::from(u.completion_tokens),
        });

        Ok(LlmResponse { text, usage })
    }
}

#[async_trait]
impl LlmService for OpenAIService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let openai_request = self.translate_request(request);

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(LlmError::from_status(status, &error_resp.error.message));
            }
            return Err(LlmError::from_status(status, &body));
        }

        let openai_response: OpenAIResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(openai_response)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmErrorKind, SystemContent};
    use mockito::{Matcher, Server};

    fn request(question: &str) -> LlmRequest {
        LlmRequest {
            system: vec![SystemContent::new("You are FinBot.")],
            messages: vec![LlmMessage::user(question)],
            max_tokens: None,
        }
    }

    #[test]
    fn test_translate_puts_system_first() {
        let service =
            OpenAIService::new("key".to_string(), "m", DEFAULT_OPENAI_BASE_URL, None).unwrap();
        let translated = service.translate_request(&request("What is a bond?"));

        assert_eq!(translated.model, "m");
        assert_eq!(translated.messages.len(), 2);
        assert_eq!(translated.messages[0].role, "system");
        assert_eq!(translated.messages[0].content.as_deref(), Some("You are FinBot."));
        assert_eq!(translated.messages[1].role, "user");
        assert_eq!(translated.messages[1].content.as_deref(), Some("What is a bond?"));
    }

    #[tokio::test]
    async fn test_complete_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJsonString(
                r#"{"model": "openai/gpt-oss-20b:free", "stream": false}"#.to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{
                    "choices": [{
                        "message": {"role": "assistant", "content": "A bond is a loan."},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
                }"#,
            )
            .create_async()
            .await;

        let service = OpenAIService::new(
            "test-key".to_string(),
            DEFAULT_OPENAI_MODEL,
            &server.url(),
            None,
        )
        .unwrap();
        let response = service.complete(&request("What is a bond?")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.text, "A bond is a loan.");
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body(r#"{"error": {"message": "slow down"}}"#)
            .create_async()
            .await;

        let service =
            OpenAIService::new("k".to_string(), DEFAULT_OPENAI_MODEL, &server.url(), None)
                .unwrap();
        let err = service.complete(&request("q")).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::RateLimit);
        assert!(err.message.contains("slow down"));
    }

    #[tokio::test]
    async fn test_complete_without_text_is_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "stop"}]}"#)
            .create_async()
            .await;

        let service =
            OpenAIService::new("k".to_string(), DEFAULT_OPENAI_MODEL, &server.url(), None)
                .unwrap();
        let err = service.complete(&request("q")).await.unwrap_err();

        assert_eq!(err.kind, LlmErrorKind::Unknown);
    }
}
