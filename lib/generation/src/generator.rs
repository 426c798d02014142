//! Explanation generator
//!
//! Each attempt ends in an [`AttemptOutcome`]. Call failures, timeouts and
//! unparseable output are retried with the identical prompt up to
//! `max_retries` times; after that the generator returns a degraded
//! explanation instead of an error, since the ranked list is still useful
//! without prose.

use crate::backend::GenerationBackend;
use crate::error::BackendError;
use crate::prompt::{FewShotExample, PromptBuilder, UserContext, ANSWER_MARKER};
use crate::references::extract_image_references;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tailor_scoring::RankedResult;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Text returned when generation cannot succeed
pub const DEGRADED_TEXT: &str = "Sorry, the recommendation service is currently unavailable.";

/// Upper bound for a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Generation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_max_context_items")]
    pub max_context_items: usize,
    #[serde(default = "default_context_char_budget")]
    pub context_char_budget: usize,
    #[serde(default)]
    pub few_shot: Vec<FewShotExample>,
}

fn default_max_retries() -> u32 {
    3
}

fn default_call_timeout_ms() -> u64 {
    30_000
}

fn default_backoff_base_ms() -> u64 {
    250
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_context_items() -> usize {
    10
}

fn default_context_char_budget() -> usize {
    4_000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            call_timeout_ms: default_call_timeout_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            max_concurrency: default_max_concurrency(),
            max_context_items: default_max_context_items(),
            context_char_budget: default_context_char_budget(),
            few_shot: Vec::new(),
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_retries == 0 {
            return Err("maxRetries must be at least 1".into());
        }
        if self.call_timeout_ms == 0 {
            return Err("callTimeoutMs must be positive".into());
        }
        if self.max_concurrency == 0 {
            return Err("maxConcurrency must be at least 1".into());
        }
        if self.max_context_items == 0 || self.context_char_budget == 0 {
            return Err("prompt context budgets must be positive".into());
        }
        Ok(())
    }

    /// Delay before retry number `attempt + 1`: `base * 2^(attempt - 1)`, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << (attempt.saturating_sub(1)).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor)).min(MAX_BACKOFF)
    }
}

/// Parsed model output
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedOutput {
    pub text: String,
    pub image_references: Vec<String>,
}

/// Result of one generation attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(GeneratedOutput),
    ParseFailure(String),
    CallFailure(String),
}

/// Whether the explanation came from the model or is the fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Degraded,
}

/// Final output of the generator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub status: GenerationStatus,
    pub recommendation_text: String,
    pub image_references: Vec<String>,
    pub attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl Explanation {
    fn success(output: GeneratedOutput, attempts: u32) -> Self {
        Self {
            status: GenerationStatus::Success,
            recommendation_text: output.text,
            image_references: output.image_references,
            attempts,
            degraded_reason: None,
        }
    }

    fn degraded(attempts: u32, reason: impl Into<String>) -> Self {
        Self {
            status: GenerationStatus::Degraded,
            recommendation_text: DEGRADED_TEXT.to_string(),
            image_references: Vec::new(),
            attempts,
            degraded_reason: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == GenerationStatus::Degraded
    }
}

#[derive(Deserialize)]
struct StructuredAnswer {
    recommendation: String,
    #[serde(default)]
    images: Vec<String>,
}

/// Interpret raw model output.
///
/// Anything after the last answer marker is the answer. Blank output is a
/// parse failure; output that opens with `{` must be a JSON object with a
/// string `recommendation` field.
pub fn parse_output(raw: &str) -> Result<GeneratedOutput, String> {
    let answer = match raw.rfind(ANSWER_MARKER) {
        Some(pos) => &raw[pos + ANSWER_MARKER.len()..],
        None => raw,
    }
    .trim();

    if answer.is_empty() {
        return Err("empty output".into());
    }

    if answer.starts_with('{') {
        let structured: StructuredAnswer = serde_json::from_str(answer)
            .map_err(|e| format!("malformed structured output: {}", e))?;
        let text = structured.recommendation.trim().to_string();
        if text.is_empty() {
            return Err("structured output has an empty recommendation".into());
        }

        let mut image_references = extract_image_references(&text);
        for image in structured.images {
            let image = image.trim().to_lowercase();
            if !image.is_empty() && !image_references.contains(&image) {
                image_references.push(image);
            }
        }
        return Ok(GeneratedOutput {
            text,
            image_references,
        });
    }

    Ok(GeneratedOutput {
        text: answer.to_string(),
        image_references: extract_image_references(answer),
    })
}

/// Turns ranked candidates into a natural-language recommendation
pub struct ExplanationGenerator {
    backend: Arc<dyn GenerationBackend>,
    prompts: PromptBuilder,
    config: GenerationConfig,
    permits: Arc<Semaphore>,
}

impl std::fmt::Debug for ExplanationGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExplanationGenerator")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl ExplanationGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: GenerationConfig) -> Self {
        let prompts = PromptBuilder::new(config.max_context_items, config.context_char_budget)
            .with_few_shot(config.few_shot.clone());
        let permits = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
        Self {
            backend,
            prompts,
            config,
            permits,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Generate an explanation; never fails, degrades instead
    pub async fn generate(&self, ranked: &[RankedResult<'_>], user: &UserContext) -> Explanation {
        self.generate_with_cancel(ranked, user, &CancellationToken::new())
            .await
    }

    /// Generate an explanation, giving up early when `cancel` fires
    pub async fn generate_with_cancel(
        &self,
        ranked: &[RankedResult<'_>],
        user: &UserContext,
        cancel: &CancellationToken,
    ) -> Explanation {
        let prompt = self.prompts.build(ranked, user);
        let max_attempts = self.config.max_retries.max(1);
        let mut last_failure = String::new();

        for attempt in 1..=max_attempts {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(attempt, "Generation cancelled");
                    return Explanation::degraded(attempt - 1, "cancelled");
                }
                outcome = self.attempt(&prompt.text) => outcome,
            };

            match outcome {
                AttemptOutcome::Success(output) => {
                    debug!(
                        attempt,
                        references = output.image_references.len(),
                        "Generation succeeded"
                    );
                    return Explanation::success(output, attempt);
                }
                AttemptOutcome::ParseFailure(reason) => {
                    warn!(attempt, max_attempts, %reason, "Unusable generation output");
                    last_failure = reason;
                }
                AttemptOutcome::CallFailure(reason) => {
                    warn!(attempt, max_attempts, %reason, "Generation call failed");
                    last_failure = reason;
                }
            }

            if attempt < max_attempts {
                let delay = self.config.backoff(attempt);
                if !delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Explanation::degraded(attempt, "cancelled"),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        warn!(attempts = max_attempts, reason = %last_failure, "Generation degraded");
        Explanation::degraded(max_attempts, last_failure)
    }

    /// One backend call under a concurrency permit and a timeout
    async fn attempt(&self, prompt: &str) -> AttemptOutcome {
        let call_timeout = Duration::from_millis(self.config.call_timeout_ms);

        let raw = {
            let Ok(_permit) = self.permits.acquire().await else {
                return AttemptOutcome::CallFailure("generation pool closed".into());
            };
            match tokio::time::timeout(call_timeout, self.backend.generate(prompt)).await {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) => return AttemptOutcome::CallFailure(e.to_string()),
                Err(_) => {
                    return AttemptOutcome::CallFailure(BackendError::Timeout(call_timeout).to_string())
                }
            }
        };

        match parse_output(&raw) {
            Ok(output) => AttemptOutcome::Success(output),
            Err(reason) => AttemptOutcome::ParseFailure(reason),
        }
    }
}
