//! LLM provider abstraction for monthly insights.
//!
//! Generation goes through the `InsightProvider` trait so the handler does
//! not care whether it talks to an OpenAI-compatible endpoint or the mock.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Empty response from model")]
    EmptyResponse,
}

/// Completion returned by a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Raw message content; expected to be a JSON object.
    pub text: String,

    /// Model that served the request.
    pub model: String,

    pub prompt_tokens: i32,
    pub completion_tokens: i32,
}

/// Chat-completion style provider that answers with a JSON object.
#[async_trait]
pub trait InsightProvider: Send + Sync {
    /// Send a system and a user message, asking for a JSON object back.
    async fn complete_json(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Name of the configured model.
    fn model(&self) -> &str;
}
