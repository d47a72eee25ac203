//! # Lorehound Agent
//! The assistant engine — grounds LLM answers in retrieved knowledge.
//!
//! ## Flow
//! 1. Search the knowledge base for chunks relevant to the question
//! 2. Inject the hits as `[Source N: label]` context blocks
//! 3. Ask the generation model for a structured JSON answer
//! 4. On failure, degrade to a fallback model with a plain prompt
//! 5. Record the interaction in the SQLite log

pub mod knowledge_manager;
pub mod response;

use std::path::PathBuf;
use std::sync::Arc;

use lorehound_core::config::LorehoundConfig;
use lorehound_core::error::Result;
use lorehound_core::traits::provider::{GenerateParams, Provider};
use lorehound_core::types::Message;
use lorehound_knowledge::backend::BackendKind;
use lorehound_memory::InteractionLog;
use lorehound_providers::failover::FailoverProvider;

pub use knowledge_manager::{KnowledgeManager, SearchHit};
pub use response::{ActionPriority, AssistantResponse, SourceReference, SuggestedAction};

const SYSTEM_PROMPT: &str = "You are a professional assistant. Provide helpful, \
accurate, detailed answers grounded in the knowledge-base context you are given. \
Cite sources from the context when possible. If the context does not cover the \
question, say so honestly.";

const FORMAT_INSTRUCTION: &str = r#"Respond with a single JSON object:
{
  "answer": "your detailed answer",
  "confidence": 0.0 to 1.0,
  "sources": [{"source": "label", "relevance": 0.0 to 1.0, "excerpt": "optional"}],
  "suggested_actions": [{"title": "...", "description": "...", "priority": "low|medium|high"}]
}"#;

/// Overview of the assistant's current state.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub chunk_count: usize,
    pub sources: Vec<String>,
    pub dimension: Option<usize>,
    pub backend: BackendKind,
    pub interactions: usize,
}

/// The Lorehound assistant — answers questions against the knowledge base.
pub struct Assistant {
    config: LorehoundConfig,
    provider: Arc<dyn Provider>,
    knowledge: KnowledgeManager,
    log: Option<InteractionLog>,
}

impl Assistant {
    /// Create an assistant from configuration.
    pub fn new(config: LorehoundConfig) -> Result<Self> {
        let primary = lorehound_providers::create_provider(&config)?;
        let provider: Arc<dyn Provider> = if config.llm.fallback_provider.is_empty() {
            Arc::from(primary)
        } else {
            let mut fallback_config = config.clone();
            fallback_config.llm.provider = config.llm.fallback_provider.clone();
            fallback_config.llm.endpoint = String::new();
            let fallback = lorehound_providers::create_provider(&fallback_config)?;
            Arc::new(FailoverProvider::with_fallback(primary, fallback))
        };

        let log = if config.memory.enabled {
            let path = PathBuf::from(shellexpand::tilde(&config.memory.db_path).to_string());
            Some(InteractionLog::open(&path)?)
        } else {
            None
        };

        let knowledge = KnowledgeManager::new(Arc::clone(&provider), &config);
        Ok(Self { config, provider, knowledge, log })
    }

    /// Create with an injected provider and in-memory log (tests, embedding).
    pub fn with_provider(config: LorehoundConfig, provider: Arc<dyn Provider>) -> Result<Self> {
        let knowledge = KnowledgeManager::new(Arc::clone(&provider), &config);
        let log = Some(InteractionLog::in_memory()?);
        Ok(Self { config, provider, knowledge, log })
    }

    pub fn knowledge(&self) -> &KnowledgeManager {
        &self.knowledge
    }

    fn model(&self) -> &str {
        if self.config.llm.model.is_empty() {
            &self.config.default_model
        } else {
            &self.config.llm.model
        }
    }

    /// Answer a question, grounded in the knowledge base.
    pub async fn ask(&self, query: &str) -> Result<AssistantResponse> {
        let hits = match self
            .knowledge
            .search(
                query,
                self.config.retrieval.top_k,
                self.config.retrieval.score_threshold,
            )
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                tracing::error!("knowledge search failed: {e}");
                return self.fallback_answer(query, 0).await;
            }
        };

        tracing::info!("search for {:?} found {} results", query, hits.len());

        let context = format_context(&hits);
        let messages = vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(query),
            Message::system(&format!("{context}\n\n{FORMAT_INSTRUCTION}")),
        ];
        let params = GenerateParams {
            model: self.model().to_string(),
            temperature: self.config.default_temperature,
            max_tokens: self.config.llm.max_tokens,
            json_mode: true,
        };

        let response = match self.provider.chat(&messages, &params).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!("generation failed: {e}");
                return self.fallback_answer(query, hits.len()).await;
            }
        };

        let result = match response.content.as_deref() {
            Some(raw) => AssistantResponse::parse_json(raw, self.model(), hits.len())
                .unwrap_or_else(|| {
                    tracing::warn!("model returned non-JSON output, using it verbatim");
                    AssistantResponse::plain(raw, 0.5, self.model(), hits.len())
                }),
            None => return self.fallback_answer(query, hits.len()).await,
        };

        self.record(query, Some(query), hits.len(), &result);
        Ok(result)
    }

    /// Degraded path: plain prompt against the fallback model.
    async fn fallback_answer(&self, query: &str, results_count: usize) -> Result<AssistantResponse> {
        tracing::info!(
            "attempting fallback model {} for {:?}",
            self.config.llm.fallback_model,
            query
        );
        let messages = vec![
            Message::system("You are a helpful assistant. Answer from general knowledge."),
            Message::user(query),
        ];
        let params = GenerateParams {
            model: self.config.llm.fallback_model.clone(),
            temperature: self.config.default_temperature,
            max_tokens: self.config.llm.max_tokens,
            json_mode: false,
        };

        let result = match self.provider.chat(&messages, &params).await {
            Ok(resp) => match resp.content {
                Some(text) => {
                    let mut r = AssistantResponse::plain(
                        &format!(
                            "The knowledge-grounded path failed, so this is general information: {text}"
                        ),
                        0.1,
                        &self.config.llm.fallback_model,
                        results_count,
                    );
                    r.suggested_actions.push(SuggestedAction {
                        title: "Retry or rephrase the question".into(),
                        description: "The grounded answer path failed; rephrasing may help.".into(),
                        priority: ActionPriority::High,
                    });
                    r
                }
                None => AssistantResponse::plain(
                    "The assistant could not produce an answer.",
                    0.0,
                    &self.config.llm.fallback_model,
                    results_count,
                ),
            },
            Err(e) => {
                tracing::error!("fallback model also failed: {e}");
                AssistantResponse::plain(
                    &format!("The assistant could not produce an answer: {e}"),
                    0.0,
                    &self.config.llm.fallback_model,
                    results_count,
                )
            }
        };

        self.record(query, None, results_count, &result);
        Ok(result)
    }

    fn record(&self, query: &str, search_query: Option<&str>, results: usize, resp: &AssistantResponse) {
        if let Some(log) = &self.log
            && let Err(e) = log.log_interaction(
                query,
                search_query,
                results,
                &resp.model_used,
                Some(&resp.answer),
            )
        {
            tracing::warn!("failed to log interaction: {e}");
        }
    }

    /// Recent interaction history, newest first.
    pub fn recent_interactions(&self, limit: usize) -> Vec<lorehound_memory::InteractionRecord> {
        self.log
            .as_ref()
            .and_then(|log| log.recent(limit).ok())
            .unwrap_or_default()
    }

    /// Current assistant state.
    pub async fn status(&self) -> StatusReport {
        StatusReport {
            chunk_count: self.knowledge.chunk_count().await,
            sources: self.knowledge.sources().await,
            dimension: self.knowledge.dimension().await,
            backend: self.knowledge.backend_kind(),
            interactions: self.log.as_ref().map(|l| l.count()).unwrap_or(0),
        }
    }
}

/// Format retrieval hits as context blocks for the generation prompt.
fn format_context(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No relevant information was found in the knowledge base.".to_string();
    }
    let mut context = String::from("Relevant information from the knowledge base:\n\n");
    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!("[Source {}: {}]\n{}\n\n", i + 1, hit.source, hit.content));
    }
    context
}
