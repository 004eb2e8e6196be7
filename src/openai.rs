//! OpenAI-compatible client configuration.

use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

use crate::config::LlmSettings;
use crate::error::{NewsdeskError, Result};

/// Create a chat client from the LLM settings.
///
/// The API key is read from the environment variable named in
/// `llm.api_key_env`; `llm.api_base` points the client at any
/// OpenAI-compatible endpoint.
pub fn create_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = settings.api_key().ok_or_else(|| {
        NewsdeskError::Config(format!("{} is not set", settings.api_key_env))
    })?;

    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = &settings.api_base {
        config = config.with_api_base(base.trim_end_matches('/'));
    }

    create_client_with_timeout(config, Duration::from_secs(settings.timeout_secs))
}

/// Create a client from an explicit config with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(config).with_http_client(http_client))
}
