//! Process configuration
//!
//! Read once at startup from the environment (a `.env` file is loaded first
//! when present) and passed down explicitly.

use crate::llm::{LlmConfig, Provider};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DB_PATH: &str = "./chat_history.db";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not found in environment or .env file")]
    MissingSecret(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars().collect())
    }

    /// Load from an explicit variable map
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let require = |provider: Provider| {
            let var = provider.api_key_env_var();
            get(var).ok_or(ConfigError::MissingSecret(var))
        };

        let google_api_key = require(Provider::Gemini)?;
        let openai_api_key = require(Provider::OpenAI)?;

        let provider = match get("FINBOT_PROVIDER") {
            Some(p) => p.parse::<Provider>().map_err(|reason| ConfigError::Invalid {
                var: "FINBOT_PROVIDER",
                reason,
            })?,
            None => Provider::default(),
        };

        let port = match get("FINBOT_PORT") {
            Some(p) => p.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: "FINBOT_PORT",
                reason: format!("{e}"),
            })?,
            None => DEFAULT_PORT,
        };

        let timeout = match get("FINBOT_LLM_TIMEOUT_SECS") {
            Some(t) => Some(Duration::from_secs(t.parse::<u64>().map_err(|e| {
                ConfigError::Invalid {
                    var: "FINBOT_LLM_TIMEOUT_SECS",
                    reason: format!("{e}"),
                }
            })?)),
            None => None,
        };

        let defaults = LlmConfig::default();
        let llm = LlmConfig {
            openai_api_key,
            google_api_key,
            provider,
            model: get("FINBOT_MODEL"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            timeout,
        };

        Ok(Self {
            db_path: get("FINBOT_DB_PATH").map_or_else(|| PathBuf::from(DEFAULT_DB_PATH), PathBuf::from),
            port,
            llm,
        })
    }
}
