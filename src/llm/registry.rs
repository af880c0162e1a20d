//! Registry of the configured LLM providers

use super::gemini::{GeminiService, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use super::openai::{OpenAIService, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use super::{LlmError, LlmService, LoggingService};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    /// `OpenAI`-compatible chat completions (`OpenRouter` by default)
    #[default]
    OpenAI,
    Gemini,
}

impl Provider {
    /// Get the display name for this provider
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::OpenAI => "OpenAI",
            Provider::Gemini => "Gemini",
        }
    }

    /// Get the environment variable name for this provider's API key
    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Gemini => "GOOGLE_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAI => DEFAULT_OPENAI_MODEL,
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openrouter" => Ok(Provider::OpenAI),
            "gemini" | "google" => Ok(Provider::Gemini),
            other => Err(format!("unknown provider '{other}' (expected openai or gemini)")),
        }
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub openai_api_key: String,
    pub google_api_key: String,
    /// Provider that answers chat questions
    pub provider: Provider,
    /// Model override for the active provider
    pub model: Option<String>,
    pub openai_base_url: String,
    pub gemini_base_url: String,
    /// No timeout when unset
    pub timeout: Option<Duration>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            google_api_key: String::new(),
            provider: Provider::default(),
            model: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

/// Registry of available LLM services, one per provider
pub struct ProviderRegistry {
    services: HashMap<Provider, Arc<dyn LlmService>>,
    active: Provider,
}

impl ProviderRegistry {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let model_for = |provider: Provider| {
            if provider == config.provider {
                config
                    .model
                    .clone()
                    .unwrap_or_else(|| provider.default_model().to_string())
            } else {
                provider.default_model().to_string()
            }
        };

        let openai: Arc<dyn LlmService> = Arc::new(OpenAIService::new(
            config.openai_api_key.clone(),
            model_for(Provider::OpenAI),
            &config.openai_base_url,
            config.timeout,
        )?);
        let gemini: Arc<dyn LlmService> = Arc::new(GeminiService::new(
            config.google_api_key.clone(),
            model_for(Provider::Gemini),
            &config.gemini_base_url,
            config.timeout,
        )?);

        let mut services: HashMap<Provider, Arc<dyn LlmService>> = HashMap::new();
        services.insert(Provider::OpenAI, Arc::new(LoggingService::new(openai)));
        services.insert(Provider::Gemini, Arc::new(LoggingService::new(gemini)));

        Ok(Self {
            services,
            active: config.provider,
        })
    }

    /// Get the service for a provider
    pub fn get(&self, provider: Provider) -> Option<Arc<dyn LlmService>> {
        self.services.get(&provider).cloned()
    }

    /// The provider that answers chat questions
    pub fn active_provider(&self) -> Provider {
        self.active
    }

    /// Service for the active provider
    pub fn active(&self) -> Result<Arc<dyn LlmService>, LlmError> {
        self.get(self.active).ok_or_else(|| {
            LlmError::unknown(format!("No service registered for {}", self.active))
        })
    }
}
