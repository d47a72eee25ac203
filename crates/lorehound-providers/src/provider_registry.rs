//! Provider registry — maps provider names to endpoint configurations.
//!
//! All OpenAI-compatible providers are defined here as static config entries.
//! The unified `OpenAiCompatibleProvider` uses these configs to connect to
//! any provider, for chat completions and embeddings alike.

use lorehound_core::types::ModelInfo;

/// How to attach auth credentials to requests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AuthStyle {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// No authentication required (local servers).
    None,
}

/// Static model definition for a provider.
#[derive(Debug, Clone)]
pub struct ModelDef {
    pub id: &'static str,
    pub name: &'static str,
    pub context_length: u32,
    pub max_output_tokens: Option<u32>,
}

impl ModelDef {
    pub fn to_model_info(&self, provider: &str) -> ModelInfo {
        ModelInfo {
            id: self.id.into(),
            name: self.name.into(),
            provider: provider.into(),
            context_length: self.context_length,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// Configuration for a single provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider identifier.
    pub name: &'static str,
    /// Base URL for the API.
    pub base_url: &'static str,
    /// Path for chat completions endpoint (appended to base_url).
    pub chat_path: &'static str,
    /// Path for text embeddings (appended to base_url).
    pub embeddings_path: &'static str,
    /// Path for listing models (appended to base_url).
    pub models_path: &'static str,
    /// Environment variable names to try for the API key (in order).
    pub env_keys: &'static [&'static str],
    /// How to send auth credentials.
    pub auth_style: AuthStyle,
    /// Environment variable to override the base URL (e.g., OLLAMA_HOST).
    pub base_url_env: Option<&'static str>,
    /// Default models to return from `list_models`.
    pub default_models: &'static [ModelDef],
    /// Default embedding model when the config names none.
    pub default_embedding_model: &'static str,
}

// ─── Provider Definitions ────────────────────────────────────────────────────

static OPENAI_MODELS: &[ModelDef] = &[
    ModelDef {
        id: "gpt-4o",
        name: "GPT-4o",
        context_length: 128000,
        max_output_tokens: Some(4096),
    },
    ModelDef {
        id: "gpt-4o-mini",
        name: "GPT-4o Mini",
        context_length: 128000,
        max_output_tokens: Some(4096),
    },
];

static OPENROUTER_MODELS: &[ModelDef] = &[
    ModelDef {
        id: "openai/gpt-4o",
        name: "GPT-4o (OpenRouter)",
        context_length: 128000,
        max_output_tokens: Some(4096),
    },
    ModelDef {
        id: "anthropic/claude-sonnet-4-20250514",
        name: "Claude Sonnet 4 (OpenRouter)",
        context_length: 200000,
        max_output_tokens: Some(8192),
    },
];

static DEEPSEEK_MODELS: &[ModelDef] = &[ModelDef {
    id: "deepseek-chat",
    name: "DeepSeek Chat",
    context_length: 128000,
    max_output_tokens: Some(8192),
}];

static GROQ_MODELS: &[ModelDef] = &[ModelDef {
    id: "llama-3.3-70b-versatile",
    name: "Llama 3.3 70B (Groq)",
    context_length: 128000,
    max_output_tokens: Some(8192),
}];

static OLLAMA_MODELS: &[ModelDef] = &[ModelDef {
    id: "llama3.2",
    name: "Llama 3.2 (Ollama)",
    context_length: 8192,
    max_output_tokens: Some(4096),
}];

static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "openai",
        base_url: "https://api.openai.com/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["OPENAI_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_models: OPENAI_MODELS,
        default_embedding_model: "text-embedding-3-small",
    },
    ProviderConfig {
        name: "openrouter",
        base_url: "https://openrouter.ai/api/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["OPENROUTER_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_models: OPENROUTER_MODELS,
        default_embedding_model: "openai/text-embedding-3-small",
    },
    ProviderConfig {
        name: "deepseek",
        base_url: "https://api.deepseek.com/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["DEEPSEEK_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_models: DEEPSEEK_MODELS,
        default_embedding_model: "deepseek-embedding",
    },
    ProviderConfig {
        name: "groq",
        base_url: "https://api.groq.com/openai/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &["GROQ_API_KEY"],
        auth_style: AuthStyle::Bearer,
        base_url_env: None,
        default_models: GROQ_MODELS,
        default_embedding_model: "nomic-embed-text-v1.5",
    },
    ProviderConfig {
        name: "ollama",
        base_url: "http://localhost:11434/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("OLLAMA_HOST"),
        default_models: OLLAMA_MODELS,
        default_embedding_model: "nomic-embed-text",
    },
    ProviderConfig {
        name: "llamacpp",
        base_url: "http://localhost:8080/v1",
        chat_path: "/chat/completions",
        embeddings_path: "/embeddings",
        models_path: "/models",
        env_keys: &[],
        auth_style: AuthStyle::None,
        base_url_env: Some("LLAMACPP_HOST"),
        default_models: &[],
        default_embedding_model: "local-embedding",
    },
];

/// Look up a provider's static config by name.
pub fn get_provider_config(name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name == name)
}

/// All registered provider names.
pub fn all_provider_names() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known() {
        let config = get_provider_config("openai").unwrap();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.embeddings_path, "/embeddings");
        assert_eq!(config.default_embedding_model, "text-embedding-3-small");
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(get_provider_config("nope").is_none());
    }

    #[test]
    fn test_local_providers_need_no_auth() {
        for name in ["ollama", "llamacpp"] {
            let config = get_provider_config(name).unwrap();
            assert_eq!(config.auth_style, AuthStyle::None);
            assert!(config.base_url_env.is_some());
        }
    }

    #[test]
    fn test_model_def_conversion() {
        let config = get_provider_config("openai").unwrap();
        let info = config.default_models[0].to_model_info("openai");
        assert_eq!(info.provider, "openai");
        assert_eq!(info.id, "gpt-4o");
    }
}
