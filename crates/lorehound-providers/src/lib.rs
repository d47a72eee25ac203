//! # Lorehound Providers
//!
//! LLM provider implementations for Lorehound.
//!
//! All OpenAI-compatible providers (OpenAI, DeepSeek, Groq, Ollama, LlamaCpp,
//! OpenRouter) are handled by a single `OpenAiCompatibleProvider`, which
//! serves both chat completions and text embeddings. `FailoverProvider`
//! chains a primary and fallback for answer generation.

pub mod failover;
pub mod openai_compatible;
pub mod provider_registry;

use lorehound_core::config::LorehoundConfig;
use lorehound_core::error::{LorehoundError, Result};
use lorehound_core::traits::Provider;

/// Create a provider from configuration.
///
/// Resolution order for provider name:
/// 1. `config.llm.provider` (from `[llm]` section)
/// 2. `config.default_provider` (legacy top-level field)
pub fn create_provider(config: &LorehoundConfig) -> Result<Box<dyn Provider>> {
    let provider_name = if !config.llm.provider.is_empty() {
        config.llm.provider.as_str()
    } else {
        config.default_provider.as_str()
    };

    match provider_name {
        // Custom endpoint: "custom:https://my-server.com/v1"
        other if other.starts_with("custom:") => Ok(Box::new(
            openai_compatible::OpenAiCompatibleProvider::custom(other, config)?,
        )),

        // All known OpenAI-compatible providers
        _ => {
            let registry = provider_registry::get_provider_config(provider_name)
                .ok_or_else(|| LorehoundError::ProviderNotFound(provider_name.into()))?;
            Ok(Box::new(
                openai_compatible::OpenAiCompatibleProvider::from_registry(registry, config)?,
            ))
        }
    }
}

/// List all available provider names.
pub fn available_providers() -> Vec<&'static str> {
    let mut names = provider_registry::all_provider_names();
    names.push("custom");
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_known_provider() {
        let config = LorehoundConfig::default();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let mut config = LorehoundConfig::default();
        config.default_provider = "does-not-exist".into();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, LorehoundError::ProviderNotFound(_)));
    }

    #[test]
    fn test_llm_section_overrides_default() {
        let mut config = LorehoundConfig::default();
        config.default_provider = "openai".into();
        config.llm.provider = "groq".into();
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn test_available_providers_include_custom() {
        let names = available_providers();
        assert!(names.contains(&"openai"));
        assert!(names.contains(&"custom"));
    }
}
