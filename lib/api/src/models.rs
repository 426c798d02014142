//! Request and response bodies

use serde::{Deserialize, Serialize};
use tailor_core::{Error, Neighbor, Result, StructuredFilter};
use tailor_generation::{Explanation, UserContext};
use tailor_scoring::{ExplainedResult, RankingStats};

/// Number of results when a request does not say
pub const DEFAULT_TOP_K: i64 = 5;

/// Longest accepted attribute value, in characters
pub const MAX_ATTRIBUTE_CHARS: usize = 256;

/// Most colours one structured request may list
pub const MAX_REQUESTED_COLOURS: usize = 16;

fn default_top_k() -> i64 {
    DEFAULT_TOP_K
}

/// `POST /recommend`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRecommendRequest {
    pub query: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub user_context: Option<UserContext>,
}

/// `POST /recommend/structured`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredRecommendRequest {
    pub gender: String,
    pub base_colour: Vec<String>,
    pub season: String,
    pub usage: String,
    pub article_type: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default)]
    pub explain: bool,
    #[serde(default)]
    pub skin_tone: Option<String>,
    #[serde(default)]
    pub height_cm: Option<u32>,
    #[serde(default)]
    pub weight_kg: Option<u32>,
}

impl TextRecommendRequest {
    /// Reject oversized fields before they reach the parser or the prompt
    pub fn validate(&self, max_query_chars: usize) -> Result<()> {
        check_length("query", &self.query, max_query_chars)?;
        check_attribute("gender", self.gender.as_deref())?;
        check_attribute("season", self.season.as_deref())?;
        if let Some(user) = &self.user_context {
            check_attribute("userContext.gender", user.gender.as_deref())?;
            check_attribute("userContext.season", user.season.as_deref())?;
            check_attribute("userContext.skinTone", user.skin_tone.as_deref())?;
        }
        Ok(())
    }
}

impl StructuredRecommendRequest {
    /// Reject oversized fields before they reach the scorer
    pub fn validate(&self) -> Result<()> {
        check_attribute("gender", Some(self.gender.as_str()))?;
        check_attribute("season", Some(self.season.as_str()))?;
        check_attribute("usage", Some(self.usage.as_str()))?;
        check_attribute("articleType", Some(self.article_type.as_str()))?;
        check_attribute("skinTone", self.skin_tone.as_deref())?;

        if self.base_colour.len() > MAX_REQUESTED_COLOURS {
            return Err(Error::InvalidArgument(format!(
                "baseColour may list at most {} colours, got {}",
                MAX_REQUESTED_COLOURS,
                self.base_colour.len()
            )));
        }
        for colour in &self.base_colour {
            check_attribute("baseColour", Some(colour.as_str()))?;
        }
        Ok(())
    }

    /// Without explicit colours, the skin tone palette (if any) constrains colour
    pub fn filter(&self) -> StructuredFilter {
        StructuredFilter::new()
            .with_colors(&self.base_colour)
            .with_styles([&self.article_type])
            .with_usage(Some(self.usage.as_str()))
            .with_gender(Some(self.gender.as_str()))
            .with_season(Some(self.season.as_str()))
            .with_skin_tone(self.skin_tone.as_deref())
    }

    pub fn user_context(&self) -> UserContext {
        UserContext {
            query: None,
            gender: Some(self.gender.clone()),
            season: Some(self.season.clone()),
            skin_tone: self.skin_tone.clone(),
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
        }
    }
}

/// Response of both recommendation endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub recommendations: Vec<ExplainedResult>,
    pub filter: StructuredFilter,
    pub stats: RankingStats,
    /// Knowledge entries that shaped the filter (text requests only)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub knowledge_matches: Vec<Neighbor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

/// `GET /readyz`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn check_length(field: &str, value: &str, max_chars: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max_chars {
        return Err(Error::InvalidArgument(format!(
            "{} must be at most {} characters, got {}",
            field, max_chars, len
        )));
    }
    Ok(())
}

fn check_attribute(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => check_length(field, value, MAX_ATTRIBUTE_CHARS),
        None => Ok(()),
    }
}

/// Convert a caller-supplied `topK` into a bounded count
pub fn validate_top_k(top_k: i64, max_top_k: usize) -> Result<usize> {
    if top_k <= 0 {
        return Err(Error::InvalidArgument(format!(
            "topK must be positive, got {}",
            top_k
        )));
    }
    let top_k = usize::try_from(top_k).unwrap_or(usize::MAX);
    if top_k > max_top_k {
        return Err(Error::InvalidArgument(format!(
            "topK must be at most {}, got {}",
            max_top_k, top_k
        )));
    }
    Ok(top_k)
}
