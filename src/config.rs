//! Configuration management for the maintenance agent.
//!
//! Configuration can be set via environment variables:
//! - `OPENAI_API_KEY` - Required. API key for the OpenAI-compatible endpoint.
//! - `OPENAI_BASE_URL` - Optional. Endpoint base URL. Defaults to `https://api.openai.com/v1`.
//! - `DEFAULT_MODEL` - Optional. Chat model identifier. Defaults to `gpt-4o-mini`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.
//! - `MAX_TURNS` - Optional. Turns of history kept per conversation. Defaults to `8`.
//! - `RETRIEVAL_AMOUNT` - Optional. Context snippets retrieved per question. Defaults to `5`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Deadline for a single ask. Defaults to `120`.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API key for the model endpoint
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Chat model identifier
    pub default_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Turns of history kept per conversation
    pub max_turns: usize,

    /// Number of context snippets fetched per question
    pub retrieval_amount: usize,

    /// Deadline applied to each ask request
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `OPENAI_API_KEY` is not set, or
    /// `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env_parse("PORT", 3000u16)?;
        let max_turns = env_parse("MAX_TURNS", 8usize)?;
        let retrieval_amount = env_parse("RETRIEVAL_AMOUNT", 5usize)?;
        let timeout_secs = env_parse("REQUEST_TIMEOUT_SECS", 120u64)?;

        Ok(Self {
            api_key,
            base_url,
            default_model,
            host,
            port,
            max_turns,
            retrieval_amount,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, default_model: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            default_model,
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_turns: 8,
            retrieval_amount: 5,
            request_timeout: Duration::from_secs(120),
        }
    }
}

fn env_parse<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => parse_value(name, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))
}
