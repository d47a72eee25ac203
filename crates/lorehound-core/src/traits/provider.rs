//! The provider trait — chat completions and text embeddings.
//!
//! One trait covers both concerns because every OpenAI-compatible API serves
//! both from the same endpoint family. Embedding failures surface as
//! `LorehoundError::EmbeddingProvider`; they are the transient class and are
//! never retried here.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Message, ModelInfo, ProviderResponse};

/// Generation parameters for a chat call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            json_mode: false,
        }
    }
}

/// An LLM provider: answer generation plus embedding generation.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "openai", "groq").
    fn name(&self) -> &str;

    /// Run a chat completion.
    async fn chat(&self, messages: &[Message], params: &GenerateParams) -> Result<ProviderResponse>;

    /// Embed a single text. The returned vector's length is fixed per model.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_many(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::error::LorehoundError::EmbeddingProvider("empty embedding response".into()))
    }

    /// Embed a batch of texts. Output is index-aligned with the input.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// List available models.
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;

    /// Check whether the provider is reachable/configured.
    async fn health_check(&self) -> Result<bool>;
}
