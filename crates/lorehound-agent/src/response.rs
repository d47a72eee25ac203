//! Structured assistant responses.
//!
//! The generation model is asked for a JSON object; parsing is lenient —
//! missing fields get defaults, malformed actions are skipped, and non-JSON
//! output degrades to a plain-text answer at the caller.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A knowledge-base source the answer leaned on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReference {
    pub source: String,
    /// Model-estimated relevance in [0, 1].
    pub relevance: f32,
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPriority {
    Low,
    Medium,
    High,
}

impl ActionPriority {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// A follow-up the assistant proposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedAction {
    pub title: String,
    pub description: String,
    pub priority: ActionPriority,
}

/// The assistant's structured answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub answer: String,
    /// Model-estimated confidence in [0, 1].
    pub confidence: f32,
    pub sources: Vec<SourceReference>,
    pub suggested_actions: Vec<SuggestedAction>,
    pub model_used: String,
    pub search_results_count: usize,
}

impl AssistantResponse {
    /// Parse the model's JSON output.
    ///
    /// Returns `None` when `raw` is not a JSON object with an `answer`
    /// string — the caller then falls back to treating the raw text as the
    /// answer. Invalid sources/actions inside an otherwise valid object are
    /// skipped, not fatal.
    pub fn parse_json(raw: &str, model_used: &str, search_results_count: usize) -> Option<Self> {
        let value: Value = serde_json::from_str(raw.trim()).ok()?;
        let obj = value.as_object()?;
        let answer = obj.get("answer")?.as_str()?.to_string();

        let confidence = obj
            .get("confidence")
            .and_then(Value::as_f64)
            .map(|c| c.clamp(0.0, 1.0) as f32)
            .unwrap_or(0.0);

        let sources = obj
            .get("sources")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|s| {
                        Some(SourceReference {
                            source: s.get("source")?.as_str()?.to_string(),
                            relevance: s
                                .get("relevance")
                                .and_then(Value::as_f64)
                                .map(|r| r.clamp(0.0, 1.0) as f32)
                                .unwrap_or(0.0),
                            excerpt: s
                                .get("excerpt")
                                .and_then(Value::as_str)
                                .map(String::from),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let suggested_actions = obj
            .get("suggested_actions")
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| {
                        let priority = a
                            .get("priority")
                            .and_then(Value::as_str)
                            .unwrap_or("medium");
                        Some(SuggestedAction {
                            title: a.get("title")?.as_str()?.to_string(),
                            description: a
                                .get("description")
                                .and_then(Value::as_str)
                                .unwrap_or("No description provided")
                                .to_string(),
                            // Unknown priority invalidates the action
                            priority: ActionPriority::parse(priority)?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            answer,
            confidence,
            sources,
            suggested_actions,
            model_used: model_used.to_string(),
            search_results_count,
        })
    }

    /// Wrap plain text as a low-structure response.
    pub fn plain(answer: &str, confidence: f32, model_used: &str, search_results_count: usize) -> Self {
        Self {
            answer: answer.to_string(),
            confidence,
            sources: vec![],
            suggested_actions: vec![],
            model_used: model_used.to_string(),
            search_results_count,
        }
    }
}
