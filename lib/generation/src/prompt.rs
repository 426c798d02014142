//! Prompt construction
//!
//! The candidate context is capped both by item count and by a character
//! budget, so a long ranking never overflows the model's input limit. The
//! user's free-text request is charged against the same budget.

use crate::sizing::size_suggestion;
use serde::{Deserialize, Serialize};
use tailor_scoring::RankedResult;

/// Marker that ends the prompt; the model's answer follows it
pub const ANSWER_MARKER: &str = "Recommendation:";

/// What we know about the person asking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin_tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<u32>,
}

impl UserContext {
    /// Size suggestion when both height and weight are known and plausible
    pub fn size_hint(&self) -> Option<String> {
        let suggestion = size_suggestion(self.height_cm?, self.weight_kg?)?;
        Some(suggestion.to_string())
    }

    fn profile_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(gender) = &self.gender {
            lines.push(format!("- gender: {}", gender));
        }
        if let Some(season) = &self.season {
            lines.push(format!("- season: {}", season));
        }
        if let Some(skin_tone) = &self.skin_tone {
            lines.push(format!("- skin tone: {}", skin_tone));
        }
        if let Some(height) = self.height_cm {
            lines.push(format!("- height: {} cm", height));
        }
        if let Some(weight) = self.weight_kg {
            lines.push(format!("- weight: {} kg", weight));
        }
        if let Some(size) = self.size_hint() {
            lines.push(format!("- suggested size: {}", size));
        }
        lines
    }
}

/// A worked request/answer pair shown before the real task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FewShotExample {
    pub request: String,
    pub response: String,
}

/// A built prompt and how many candidates made it into the context
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub included_items: usize,
}

/// Formats ranked candidates and user context into a generation prompt
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    few_shot: Vec<FewShotExample>,
    max_context_items: usize,
    context_char_budget: usize,
}

impl PromptBuilder {
    pub fn new(max_context_items: usize, context_char_budget: usize) -> Self {
        Self {
            few_shot: Vec::new(),
            max_context_items,
            context_char_budget,
        }
    }

    #[must_use]
    pub fn with_few_shot(mut self, examples: Vec<FewShotExample>) -> Self {
        self.few_shot = examples;
        self
    }

    /// Build the prompt for the given candidates
    pub fn build(&self, ranked: &[RankedResult<'_>], user: &UserContext) -> Prompt {
        let query = user
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| truncate_chars(q, self.context_char_budget));
        let remaining = self
            .context_char_budget
            .saturating_sub(query.map_or(0, |q| q.chars().count()));
        let (context, included_items) = self.context_block(ranked, remaining);
        let mut text = String::new();

        for example in &self.few_shot {
            text.push_str("User: ");
            text.push_str(&example.request);
            text.push_str("\nAssistant: ");
            text.push_str(&example.response);
            text.push_str("\n\n");
        }

        text.push_str("--- Current Task ---\n");
        text.push_str(
            "You are a fashion assistant. Recommend an outfit using only the catalog items \
             listed below and explain why they suit the user. Mention every item you pick \
             as `image: <file>`.\n",
        );

        let profile = user.profile_lines();
        if !profile.is_empty() {
            text.push_str("User profile:\n");
            for line in profile {
                text.push_str(&line);
                text.push('\n');
            }
        }
        if let Some(query) = query {
            text.push_str("Request: ");
            text.push_str(query);
            text.push('\n');
        }

        text.push_str("Catalog items:\n");
        if context.is_empty() {
            text.push_str("(no matching items)\n");
        } else {
            text.push_str(&context);
        }
        text.push_str(ANSWER_MARKER);

        Prompt {
            text,
            included_items,
        }
    }

    /// Candidate lines in rank order, stopping at the first one that would
    /// exceed the item or character budget
    fn context_block(&self, ranked: &[RankedResult<'_>], budget: usize) -> (String, usize) {
        let mut block = String::new();
        let mut used = 0;
        let mut included = 0;

        for result in ranked.iter().take(self.max_context_items) {
            let line = candidate_line(result);
            let len = line.chars().count();
            if used + len > budget {
                break;
            }
            block.push_str(&line);
            used += len;
            included += 1;
        }

        if included < ranked.len() {
            tracing::debug!(
                included,
                ranked = ranked.len(),
                budget,
                "Truncated prompt context"
            );
        }

        (block, included)
    }
}

/// Longest prefix of `s` with at most `max_chars` characters
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}

fn candidate_line(result: &RankedResult<'_>) -> String {
    let record = result.record;
    let mut line = format!(
        "- image: {} | {} | {} | {}, {}",
        record.image_reference(),
        record.article_type,
        record.base_colour.join("/"),
        record.usage,
        record.season,
    );
    if let Some(material) = &record.material {
        line.push_str(" | ");
        line.push_str(material);
    }
    if let Some(name) = &record.display_name {
        line.push_str(" | ");
        line.push_str(name);
    }
    line.push('\n');
    line
}
