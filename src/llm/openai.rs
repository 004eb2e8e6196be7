//! Chat-completion backed generator.

use super::TextGenerator;
use crate::config::LlmSettings;
use crate::error::{GenerationFailure, NewsdeskError, Result};
use crate::openai::create_client;
use async_openai::error::OpenAIError;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Generator that sends each prompt as a single user message.
pub struct OpenAiGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiGenerator {
    /// Create a generator from the LLM settings.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(settings)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(classify_openai_error)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(self.temperature)
            .build()
            .map_err(classify_openai_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(classify_openai_error)?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                NewsdeskError::generation(GenerationFailure::Malformed, "empty response from model")
            })?;

        debug!(chars = text.chars().count(), "Generated completion");
        Ok(text)
    }
}

/// Map a client error onto the generation failure taxonomy.
pub(crate) fn classify_openai_error(err: OpenAIError) -> NewsdeskError {
    let kind = match &err {
        OpenAIError::Reqwest(e) if e.is_timeout() => GenerationFailure::Timeout,
        OpenAIError::Reqwest(_) | OpenAIError::StreamError(_) => GenerationFailure::Transport,
        OpenAIError::ApiError(api) => {
            let marker = format!(
                "{} {} {}",
                api.r#type.as_deref().unwrap_or_default(),
                api.code.as_deref().unwrap_or_default(),
                api.message
            )
            .to_lowercase();
            api_failure_kind(&marker)
        }
        OpenAIError::JSONDeserialize(_) => GenerationFailure::Malformed,
        _ => GenerationFailure::Rejected,
    };
    NewsdeskError::generation(kind, err.to_string())
}

fn api_failure_kind(marker: &str) -> GenerationFailure {
    const RATE_LIMIT: [&str; 4] = ["rate_limit", "quota", "resource_exhausted", "too many requests"];
    const SERVER_SIDE: [&str; 4] = ["server_error", "unavailable", "internal", "overloaded"];

    if RATE_LIMIT.iter().any(|m| marker.contains(m)) {
        GenerationFailure::RateLimited
    } else if SERVER_SIDE.iter().any(|m| marker.contains(m)) {
        GenerationFailure::Transport
    } else {
        GenerationFailure::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_failure_kind() {
        assert_eq!(
            api_failure_kind("requests rate_limit_exceeded slow down"),
            GenerationFailure::RateLimited
        );
        assert_eq!(
            api_failure_kind("resource_exhausted quota exceeded"),
            GenerationFailure::RateLimited
        );
        assert_eq!(
            api_failure_kind("server_error  the model is overloaded"),
            GenerationFailure::Transport
        );
        assert_eq!(
            api_failure_kind("invalid_request_error model_not_found"),
            GenerationFailure::Rejected
        );
    }

    #[test]
    fn test_deserialize_error_is_malformed() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = classify_openai_error(OpenAIError::JSONDeserialize(json_err));
        assert!(matches!(
            err,
            NewsdeskError::Generation {
                kind: GenerationFailure::Malformed,
                ..
            }
        ));
    }
}
