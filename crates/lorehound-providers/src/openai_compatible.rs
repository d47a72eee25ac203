//! Unified OpenAI-compatible provider.
//!
//! A single struct that handles chat completions AND text embeddings for all
//! OpenAI-compatible APIs. Different providers are distinguished only by
//! endpoint URL, auth style, and API key.
//!
//! Embedding failures map to `LorehoundError::EmbeddingProvider` — callers
//! treat that as the one transient failure class and decide retry policy
//! themselves.

use async_trait::async_trait;
use lorehound_core::config::LorehoundConfig;
use lorehound_core::error::{LorehoundError, Result};
use lorehound_core::traits::provider::{GenerateParams, Provider};
use lorehound_core::types::{Message, ModelInfo, ProviderResponse, Usage};
use serde_json::{Value, json};

use crate::provider_registry::{AuthStyle, ProviderConfig};

/// A unified provider that works with any OpenAI-compatible API.
pub struct OpenAiCompatibleProvider {
    /// Provider name (e.g., "openai", "groq", "deepseek").
    name: String,
    /// API key for authentication.
    api_key: String,
    /// Base URL for the API (e.g., "https://api.openai.com/v1").
    base_url: String,
    /// Path for chat completions (e.g., "/chat/completions").
    chat_path: String,
    /// Path for text embeddings (e.g., "/embeddings").
    embeddings_path: String,
    /// Path for listing models (e.g., "/models").
    models_path: String,
    /// Authentication style.
    auth_style: AuthStyle,
    /// Default models to return from `list_models`.
    default_models: Vec<ModelInfo>,
    /// Embedding model id sent with every embeddings request.
    embedding_model: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    /// Create from a known provider config + LorehoundConfig.
    ///
    /// Resolution order:
    /// - API key: `config.llm.api_key` > `config.api_key` > env vars > empty
    /// - Base URL: `config.llm.endpoint` > env override > registry default
    /// - Embedding model: `config.embedding.model` > registry default
    pub fn from_registry(registry: &ProviderConfig, config: &LorehoundConfig) -> Result<Self> {
        let api_key = if !config.llm.api_key.is_empty() {
            config.llm.api_key.clone()
        } else if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            registry
                .env_keys
                .iter()
                .find_map(|key| std::env::var(key).ok())
                .unwrap_or_default()
        };

        let base_url = if !config.llm.endpoint.is_empty() {
            config.llm.endpoint.clone()
        } else {
            registry
                .base_url_env
                .and_then(|env_key| {
                    let val = std::env::var(env_key).ok()?;
                    // For OLLAMA_HOST / LLAMACPP_HOST, append /v1 if not present
                    if val.ends_with("/v1") {
                        Some(val)
                    } else {
                        Some(format!("{}/v1", val.trim_end_matches('/')))
                    }
                })
                .unwrap_or_else(|| registry.base_url.to_string())
        };

        let embedding_model = if !config.embedding.model.is_empty() {
            config.embedding.model.clone()
        } else {
            registry.default_embedding_model.to_string()
        };

        let default_models = registry
            .default_models
            .iter()
            .map(|m| m.to_model_info(registry.name))
            .collect();

        Ok(Self {
            name: registry.name.to_string(),
            api_key,
            base_url,
            chat_path: registry.chat_path.to_string(),
            embeddings_path: registry.embeddings_path.to_string(),
            models_path: registry.models_path.to_string(),
            auth_style: registry.auth_style,
            default_models,
            embedding_model,
            client: reqwest::Client::new(),
        })
    }

    /// Create for a custom endpoint (e.g., "custom:https://my-server.com/v1").
    pub fn custom(endpoint: &str, config: &LorehoundConfig) -> Result<Self> {
        let base_url = endpoint
            .strip_prefix("custom:")
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        let api_key = if !config.api_key.is_empty() {
            config.api_key.clone()
        } else {
            std::env::var("CUSTOM_API_KEY").unwrap_or_default()
        };

        let auth_style = if api_key.is_empty() {
            AuthStyle::None
        } else {
            AuthStyle::Bearer
        };

        let embedding_model = if !config.embedding.model.is_empty() {
            config.embedding.model.clone()
        } else {
            "text-embedding-3-small".to_string()
        };

        Ok(Self {
            name: "custom".to_string(),
            api_key,
            base_url,
            chat_path: "/chat/completions".to_string(),
            embeddings_path: "/embeddings".to_string(),
            models_path: "/models".to_string(),
            auth_style,
            default_models: vec![],
            embedding_model,
            client: reqwest::Client::new(),
        })
    }

    /// Build the auth header for the request.
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth_style {
            AuthStyle::Bearer if !self.api_key.is_empty() => {
                req.header("Authorization", format!("Bearer {}", self.api_key))
            }
            _ => req,
        }
    }

    fn require_api_key(&self) -> Result<()> {
        if self.auth_style != AuthStyle::None && self.api_key.is_empty() {
            return Err(LorehoundError::ApiKeyMissing(self.name.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, messages: &[Message], params: &GenerateParams) -> Result<ProviderResponse> {
        self.require_api_key()?;

        // Standard OpenAI request body
        let mut body = json!({
            "model": params.model,
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
            "messages": serde_json::to_value(messages).unwrap_or_default(),
        });
        if params.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }

        let url = format!("{}{}", self.base_url, self.chat_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        let resp = req.send().await.map_err(|e| {
            LorehoundError::Http(format!("{} connection failed ({}): {}", self.name, url, e))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LorehoundError::Provider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        // Parse response — standard OpenAI format
        let json: Value = resp
            .json()
            .await
            .map_err(|e| LorehoundError::Http(e.to_string()))?;

        let choice = json["choices"]
            .get(0)
            .ok_or_else(|| LorehoundError::Provider("No choices in response".into()))?;

        let content = choice["message"]["content"].as_str().map(String::from);

        let usage = json["usage"].as_object().map(|u| Usage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        });

        Ok(ProviderResponse {
            content,
            finish_reason: choice["finish_reason"].as_str().map(String::from),
            usage,
        })
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.require_api_key()
            .map_err(|e| LorehoundError::EmbeddingProvider(e.to_string()))?;

        let body = json!({
            "model": self.embedding_model,
            "input": texts,
        });

        let url = format!("{}{}", self.base_url, self.embeddings_path);
        let req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        let req = self.apply_auth(req);

        let resp = req.send().await.map_err(|e| {
            LorehoundError::EmbeddingProvider(format!(
                "{} connection failed ({}): {}",
                self.name, url, e
            ))
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LorehoundError::EmbeddingProvider(format!(
                "{} API error {}: {}",
                self.name, status, text
            )));
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LorehoundError::EmbeddingProvider(e.to_string()))?;

        let data = json["data"]
            .as_array()
            .ok_or_else(|| LorehoundError::EmbeddingProvider("no data in response".into()))?;

        // Providers may reorder entries; "index" restores input alignment.
        let mut vectors: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for entry in data {
            let index = entry["index"].as_u64().unwrap_or(0) as usize;
            let embedding: Vec<f32> = entry["embedding"]
                .as_array()
                .ok_or_else(|| LorehoundError::EmbeddingProvider("malformed embedding".into()))?
                .iter()
                .map(|v| v.as_f64().unwrap_or(0.0) as f32)
                .collect();
            if index >= texts.len() {
                return Err(LorehoundError::EmbeddingProvider(format!(
                    "embedding index {index} out of range"
                )));
            }
            vectors[index] = Some(embedding);
        }

        vectors
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                LorehoundError::EmbeddingProvider(format!(
                    "{} returned {} embeddings for {} inputs",
                    self.name,
                    data.len(),
                    texts.len()
                ))
            })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        // Try to fetch models from the API
        let url = format!("{}{}", self.base_url, self.models_path);
        let req = self.client.get(&url);
        let req = self.apply_auth(req);

        match req.send().await {
            Ok(r) if r.status().is_success() => {
                let json: Value = r.json().await.unwrap_or_default();
                let models: Vec<ModelInfo> = json["data"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|m| {
                                Some(ModelInfo {
                                    id: m["id"].as_str()?.to_string(),
                                    name: m["id"].as_str()?.to_string(),
                                    provider: self.name.clone(),
                                    context_length: 4096,
                                    max_output_tokens: Some(4096),
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if models.is_empty() {
                    Ok(self.default_models.clone())
                } else {
                    Ok(models)
                }
            }
            _ => Ok(self.default_models.clone()),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        if self.auth_style != AuthStyle::None {
            // For cloud providers, just check if API key is set
            return Ok(!self.api_key.is_empty());
        }

        // For local servers (ollama, llamacpp), try to connect
        let url = format!("{}{}", self.base_url, self.models_path);
        let resp = self.client.get(&url).send().await;
        Ok(resp.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider_registry::get_provider_config;

    fn test_config() -> LorehoundConfig {
        let mut config = LorehoundConfig::default();
        config.api_key = "test-key".into();
        config
    }

    #[test]
    fn test_from_registry_resolves_embedding_model() {
        let registry = get_provider_config("openai").unwrap();
        let provider =
            OpenAiCompatibleProvider::from_registry(registry, &test_config()).unwrap();
        assert_eq!(provider.embedding_model, "text-embedding-3-small");

        let mut config = test_config();
        config.embedding.model = "text-embedding-3-large".into();
        let provider = OpenAiCompatibleProvider::from_registry(registry, &config).unwrap();
        assert_eq!(provider.embedding_model, "text-embedding-3-large");
    }

    #[test]
    fn test_custom_endpoint_parsing() {
        let provider =
            OpenAiCompatibleProvider::custom("custom:https://my-server.com/v1/", &test_config())
                .unwrap();
        assert_eq!(provider.name(), "custom");
        assert_eq!(provider.base_url, "https://my-server.com/v1");
        assert_eq!(provider.auth_style, AuthStyle::Bearer);
    }

    #[test]
    fn test_custom_without_key_needs_no_auth() {
        let mut config = test_config();
        config.api_key = String::new();
        // Only applies when CUSTOM_API_KEY is unset in the environment
        if std::env::var("CUSTOM_API_KEY").is_err() {
            let provider =
                OpenAiCompatibleProvider::custom("custom:http://localhost:9999", &config).unwrap();
            assert_eq!(provider.auth_style, AuthStyle::None);
        }
    }

    #[tokio::test]
    async fn test_embed_without_key_is_embedding_error() {
        let registry = get_provider_config("openai").unwrap();
        let mut config = LorehoundConfig::default();
        config.api_key = String::new();
        // Only meaningful when no ambient OPENAI_API_KEY
        if std::env::var("OPENAI_API_KEY").is_err() {
            let provider = OpenAiCompatibleProvider::from_registry(registry, &config).unwrap();
            let err = provider.embed_many(&["hello".to_string()]).await.unwrap_err();
            assert!(matches!(err, LorehoundError::EmbeddingProvider(_)));
        }
    }

    #[tokio::test]
    async fn test_embed_empty_batch_is_noop() {
        let registry = get_provider_config("openai").unwrap();
        let provider =
            OpenAiCompatibleProvider::from_registry(registry, &test_config()).unwrap();
        let vectors = provider.embed_many(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
