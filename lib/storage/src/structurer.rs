//! Structuring raw advice conversations into knowledge sources
//!
//! A text-generation backend turns each cleaned conversation into a JSON
//! record. Calls and parses are retried under the same bounded policy as
//! explanations (`maxRetries`, per-call timeout, capped exponential
//! backoff). A conversation that never yields a usable record is skipped.

use crate::builder::{clean_text, KnowledgeSource};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tailor_generation::{BackendError, GenerationBackend, GenerationConfig};

const STRUCTURING_INSTRUCTIONS: &str = "Convert the following clothing-advice conversation into \
structured data. Reply with a single JSON object and nothing else, using exactly these fields:
{\"request\": \"one or two sentences summarising what the user needs\", \
\"styles\": [], \"materials\": [], \"colors\": [], \
\"products\": [{\"name\": \"\", \"color\": \"\", \"material\": \"\"}], \
\"sceneTags\": [\"at least three occasion tags\"]}
Conversation:
";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StructuredConversation {
    #[serde(default)]
    request: String,
    #[serde(default)]
    styles: Vec<String>,
    #[serde(default)]
    materials: Vec<String>,
    #[serde(default)]
    colors: Vec<String>,
    #[serde(default)]
    products: Vec<ProductMention>,
    #[serde(default)]
    scene_tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductMention {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: String,
    #[serde(default)]
    material: String,
}

/// Prompt asking the model to structure one conversation
pub fn structuring_prompt(conversation: &str) -> String {
    format!("{}{}\nJSON:", STRUCTURING_INSTRUCTIONS, conversation)
}

/// Parse a model reply into a knowledge source.
///
/// Full-width commas and colons are normalized and code fences or chatter
/// around the outermost JSON object are ignored. A reply without a
/// `request` summary is unusable.
pub fn parse_structured(raw: &str) -> std::result::Result<KnowledgeSource, String> {
    let normalized = raw.replace('，', ",").replace('：', ":");
    let (Some(start), Some(end)) = (normalized.find('{'), normalized.rfind('}')) else {
        return Err("no JSON object in output".into());
    };
    if end < start {
        return Err("no JSON object in output".into());
    }

    let parsed: StructuredConversation = serde_json::from_str(&normalized[start..=end])
        .map_err(|e| format!("malformed structured output: {}", e))?;

    let text = parsed.request.trim();
    if text.is_empty() {
        return Err("structured output has no request summary".into());
    }

    let mut colors = parsed.colors;
    let mut materials = parsed.materials;
    let mut styles = parsed.styles;
    for product in parsed.products {
        push_non_blank(&mut styles, product.name);
        push_non_blank(&mut colors, product.color);
        push_non_blank(&mut materials, product.material);
    }

    Ok(KnowledgeSource {
        text: text.to_string(),
        colors,
        styles,
        materials,
        scene_tags: parsed.scene_tags,
    })
}

fn push_non_blank(values: &mut Vec<String>, value: String) {
    if !value.trim().is_empty() {
        values.push(value);
    }
}

/// Read raw conversations: a JSON array of strings, or one per non-blank line
pub fn load_conversations(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read conversations {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse conversations {}", path.display()));
    }
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Structures conversations through a generation backend
pub struct KnowledgeStructurer {
    backend: Arc<dyn GenerationBackend>,
    config: GenerationConfig,
}

impl KnowledgeStructurer {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: GenerationConfig) -> Self {
        Self { backend, config }
    }

    /// Structure one conversation, or `None` once every attempt has failed
    pub async fn structure(&self, conversation: &str) -> Option<KnowledgeSource> {
        let cleaned = clean_text(conversation);
        if cleaned.is_empty() {
            return None;
        }

        let prompt = structuring_prompt(&cleaned);
        let call_timeout = Duration::from_millis(self.config.call_timeout_ms);
        let max_attempts = self.config.max_retries.max(1);

        for attempt in 1..=max_attempts {
            let failure = match tokio::time::timeout(call_timeout, self.backend.generate(&prompt)).await {
                Ok(Ok(raw)) => match parse_structured(&raw) {
                    Ok(source) => return Some(source),
                    Err(reason) => reason,
                },
                Ok(Err(e)) => e.to_string(),
                Err(_) => BackendError::Timeout(call_timeout).to_string(),
            };
            tracing::warn!(attempt, max_attempts, reason = %failure, "Structuring attempt failed");

            if attempt < max_attempts {
                tokio::time::sleep(self.config.backoff(attempt)).await;
            }
        }
        None
    }

    /// Structure conversations in order, dropping the ones that fail
    pub async fn structure_all(&self, conversations: &[String]) -> Vec<KnowledgeSource> {
        let mut sources = Vec::with_capacity(conversations.len());
        for (position, conversation) in conversations.iter().enumerate() {
            match self.structure(conversation).await {
                Some(source) => sources.push(source),
                None => tracing::warn!(position, "Skipping conversation that could not be structured"),
            }
        }
        tracing::info!(
            conversations = conversations.len(),
            structured = sources.len(),
            backend = self.backend.name(),
            "Conversations structured"
        );
        sources
    }
}
