use super::generation_repository::{GenerationRepository, GenerationRepositoryError};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Returned when the model produces no content
const EMPTY_COMPLETION: &str = "No proposal generated.";

/// OpenAI chat-completions implementation of the generation repository
pub struct OpenAiGenerationRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiGenerationRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    pub fn from_api_key(api_key: &str, model: String) -> Self {
        Self::with_config(OpenAIConfig::new().with_api_key(api_key), model)
    }

    /// Points the client at another OpenAI-compatible endpoint
    pub fn with_api_base(api_key: &str, api_base: &str, model: String) -> Self {
        Self::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(api_base),
            model,
        )
    }

    fn with_config(config: OpenAIConfig, model: String) -> Self {
        let client = Client::with_config(config).with_backoff(no_retry_backoff());
        Self::new(Arc::new(client), model)
    }
}

/// The client retries throttled calls by default until the backoff gives up.
/// A zero budget hands the first 429 straight back so callers can retry later.
fn no_retry_backoff() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

#[async_trait]
impl GenerationRepository for OpenAiGenerationRepository {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationRepositoryError> {
        let start_time = std::time::Instant::now();

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(classify_error)?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(classify_error)?
                    .into(),
            ])
            .max_tokens(max_tokens)
            .build()
            .map_err(classify_error)?;

        tracing::info!(
            model = %self.model,
            prompt_length = user_prompt.len(),
            max_tokens = max_tokens,
            "Calling OpenAI chat completions API"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                "OpenAI chat completions call failed"
            );
            classify_error(e)
        })?;

        let text = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| EMPTY_COMPLETION.to_string());

        tracing::info!(
            provider = "openai",
            model = %self.model,
            latency_ms = start_time.elapsed().as_millis(),
            output_length = text.len(),
            "Proposal generation completed"
        );

        Ok(text)
    }
}

fn classify_error(err: OpenAIError) -> GenerationRepositoryError {
    match &err {
        OpenAIError::ApiError(api_error)
            if is_rate_limit_error(api_error.r#type.as_deref(), &api_error.message) =>
        {
            GenerationRepositoryError::RateLimited(api_error.message.clone())
        }
        OpenAIError::Reqwest(http_error)
            if http_error.status().map(|s| s.as_u16()) == Some(429) =>
        {
            GenerationRepositoryError::RateLimited(http_error.to_string())
        }
        _ => GenerationRepositoryError::ServiceError(err.to_string()),
    }
}

/// OpenAI reports throttling as HTTP 429 with one of these error types
fn is_rate_limit_error(error_type: Option<&str>, message: &str) -> bool {
    matches!(
        error_type,
        Some("rate_limit_exceeded") | Some("insufficient_quota") | Some("requests") | Some("tokens")
    ) || message.to_ascii_lowercase().contains("rate limit")
}
