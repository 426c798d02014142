//! Explainability for ranked results
//!
//! Output structures that show how each score was built, one weighted
//! contribution per term.

use crate::rank::{RankedResult, ScoreBreakdown};
use crate::weights::ScoreTerm;
use serde::Serialize;

/// A ranked record in its outbound shape
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainedResult {
    pub id: u64,
    pub article_type: String,
    pub base_colour: Vec<String>,
    pub score: f32,
    pub image_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Per-term weighted contributions
    pub explain: ScoreBreakdown,
}

impl ExplainedResult {
    pub fn from_ranked(ranked: &RankedResult<'_>) -> Self {
        Self {
            id: ranked.record.id,
            article_type: ranked.record.article_type.clone(),
            base_colour: ranked.record.base_colour.clone(),
            score: ranked.score,
            image_reference: ranked.record.image_reference(),
            display_name: ranked.record.display_name.clone(),
            explain: ranked.breakdown,
        }
    }

    pub fn from_ranked_list(ranked: &[RankedResult<'_>]) -> Vec<Self> {
        ranked.iter().map(Self::from_ranked).collect()
    }
}

/// Summary statistics for one ranking
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingStats {
    /// Records that passed the hard pre-filter
    pub considered: usize,
    /// Number of results returned
    pub results_count: usize,
    pub best_score: f32,
    pub avg_score: f32,
    /// Term that contributed most to the best result
    pub top_contributing_term: Option<ScoreTerm>,
}

impl RankingStats {
    pub fn compute(results: &[RankedResult<'_>], considered: usize) -> Self {
        let Some(best) = results.first() else {
            return Self {
                considered,
                results_count: 0,
                best_score: 0.0,
                avg_score: 0.0,
                top_contributing_term: None,
            };
        };

        let avg_score = results.iter().map(|r| r.score).sum::<f32>() / results.len() as f32;

        Self {
            considered,
            results_count: results.len(),
            best_score: best.score,
            avg_score,
            top_contributing_term: best.breakdown.top_term(),
        }
    }
}
