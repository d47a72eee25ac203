//! Lorehound configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LorehoundConfig {
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

fn default_api_key() -> String { String::new() }
fn default_provider() -> String { "openai".into() }
fn default_model() -> String { "gpt-4o-mini".into() }
fn default_temperature() -> f32 { 0.7 }

impl Default for LorehoundConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            knowledge: KnowledgeConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl LorehoundConfig {
    /// Load config from the default path (~/.lorehound/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::error::LorehoundError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| crate::error::LorehoundError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LorehoundError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lorehound")
            .join("config.toml")
    }

    /// Get the Lorehound home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lorehound")
    }
}

/// LLM provider configuration for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name (overrides the top-level `default_provider`).
    #[serde(default)]
    pub provider: String,
    /// Model id (overrides the top-level `default_model`).
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    /// Custom endpoint override (e.g. a local server).
    #[serde(default)]
    pub endpoint: String,
    /// Secondary provider chained behind the primary for answer generation.
    #[serde(default)]
    pub fallback_provider: String,
    /// Fallback model used when the grounded answer path fails.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_fallback_model() -> String { "gpt-4o-mini".into() }
fn default_max_tokens() -> u32 { 1024 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: String::new(),
            model: String::new(),
            api_key: String::new(),
            endpoint: String::new(),
            fallback_provider: String::new(),
            fallback_model: default_fallback_model(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Chunks per embedding request during ingestion.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_embedding_model() -> String { "text-embedding-3-small".into() }
fn default_batch_size() -> usize { 20 }

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            batch_size: default_batch_size(),
        }
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Results scoring below this are dropped by filtered search.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// "auto" probes the CPU once; "portable" forces the scalar backend.
    #[serde(default = "default_backend")]
    pub backend: String,
}

fn default_top_k() -> usize { 3 }
fn default_score_threshold() -> f32 { 0.6 }
fn default_backend() -> String { "auto".into() }

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: default_score_threshold(),
            backend: default_backend(),
        }
    }
}

/// Knowledge base ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned for *.md / *.txt documents.
    #[serde(default = "default_knowledge_dir")]
    pub dir: String,
    /// Paragraphs shorter than this are skipped during chunking.
    #[serde(default = "default_chunk_min_chars")]
    pub chunk_min_chars: usize,
}

fn default_knowledge_dir() -> String { "~/.lorehound/knowledge".into() }
fn default_chunk_min_chars() -> usize { 20 }

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: default_knowledge_dir(),
            chunk_min_chars: default_chunk_min_chars(),
        }
    }
}

/// Interaction log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn bool_true() -> bool { true }
fn default_db_path() -> String { "~/.lorehound/interactions.db".into() }

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: bool_true(),
            db_path: default_db_path(),
        }
    }
}
