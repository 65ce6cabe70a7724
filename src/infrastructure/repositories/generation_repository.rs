use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum GenerationRepositoryError {
    /// Backend throttled the request; retry after a short delay
    #[error("generation backend rate limited: {0}")]
    RateLimited(String),
    #[error("generation backend failed: {0}")]
    ServiceError(String),
}

/// Repository for proposal text generation.
/// Abstracts the underlying language model provider.
///
/// Implementations are stateless: one system prompt and one user prompt in,
/// generated text out.
#[async_trait]
pub trait GenerationRepository: Send + Sync {
    /// Generate text for the given prompts
    ///
    /// # Arguments
    /// * `system_prompt` - Fixed persona instructions
    /// * `user_prompt` - Sanitized job description, profile and tone
    /// * `max_tokens` - Upper bound on generated output
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerationRepositoryError>;
}
