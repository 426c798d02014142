//! Candidate selection and ranking
//!
//! Color (plus the optional gender and season constraints) narrows the
//! candidate set first; style, material and usage only add to the score of
//! the records that survive.

use crate::similarity::{best_fuzzy_match, colour_overlap, contains_any};
use crate::weights::{ScoreTerm, ScoreWeights};
use serde::Serialize;
use tailor_core::{CatalogRecord, Error, Result, StructuredFilter};

/// Gender value that satisfies any requested gender
const UNISEX: &str = "unisex";

/// Weighted contribution of each term to a record's score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub color: f32,
    pub style: f32,
    pub material: f32,
    pub usage: f32,
}

impl ScoreBreakdown {
    pub fn get(&self, term: ScoreTerm) -> f32 {
        match term {
            ScoreTerm::Color => self.color,
            ScoreTerm::Style => self.style,
            ScoreTerm::Material => self.material,
            ScoreTerm::Usage => self.usage,
        }
    }

    pub fn total(&self) -> f32 {
        self.color + self.style + self.material + self.usage
    }

    /// The term contributing most, if any contributed at all
    pub fn top_term(&self) -> Option<ScoreTerm> {
        ScoreTerm::ALL
            .into_iter()
            .filter(|t| self.get(*t) > 0.0)
            .fold(None, |best: Option<ScoreTerm>, t| match best {
                Some(b) if self.get(b) >= self.get(t) => Some(b),
                _ => Some(t),
            })
    }
}

/// A scored candidate
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResult<'a> {
    /// The catalog record
    pub record: &'a CatalogRecord,
    /// Position of the record in the catalog snapshot
    pub position: usize,
    /// Overall weighted score
    pub score: f32,
    /// Per-term weighted contributions
    pub breakdown: ScoreBreakdown,
}

/// Ranked results together with the size of the candidate set they came from
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    pub results: Vec<RankedResult<'a>>,
    /// Records that survived the pre-filter, before truncation to `top_k`
    pub candidates: usize,
}

/// Scores catalog records against a structured filter
#[derive(Debug, Clone, Default)]
pub struct Scorer {
    weights: ScoreWeights,
}

impl Scorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Whether a record survives the hard pre-filters
    pub fn is_candidate(&self, record: &CatalogRecord, filter: &StructuredFilter) -> bool {
        let colour_ok = filter.colors.is_empty()
            || record.base_colour.iter().any(|c| filter.colors.contains(c));
        let gender_ok = filter.genders.is_empty()
            || record.gender == UNISEX
            || filter.genders.contains(&record.gender);
        let season_ok = filter.seasons.is_empty() || filter.seasons.contains(&record.season);

        colour_ok && gender_ok && season_ok
    }

    /// Compute the weighted score of a single record
    pub fn score(&self, record: &CatalogRecord, filter: &StructuredFilter) -> ScoreBreakdown {
        let w = &self.weights;
        ScoreBreakdown {
            color: w.color * colour_overlap(&record.base_colour, &filter.colors),
            style: w.style * best_fuzzy_match(&filter.styles, &record.article_type),
            material: w.material * contains_any(&filter.materials, record.material.as_deref()),
            usage: w.usage * contains_any(&filter.usages, Some(&record.usage)),
        }
    }

    /// Pre-filter, score and rank records, keeping at most `top_k`.
    ///
    /// Results are ordered by descending score; equal scores keep catalog
    /// order. An empty candidate set yields an empty vector.
    pub fn score_and_rank<'a>(
        &self,
        records: &'a [CatalogRecord],
        filter: &StructuredFilter,
        top_k: usize,
    ) -> Result<Vec<RankedResult<'a>>> {
        Ok(self.rank(records, filter, top_k)?.results)
    }

    /// Same as [`Scorer::score_and_rank`], also reporting how many records
    /// passed the pre-filter
    pub fn rank<'a>(
        &self,
        records: &'a [CatalogRecord],
        filter: &StructuredFilter,
        top_k: usize,
    ) -> Result<Ranking<'a>> {
        if top_k == 0 {
            return Err(Error::InvalidArgument("topK must be positive".into()));
        }

        let mut results: Vec<RankedResult<'a>> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.is_candidate(record, filter))
            .map(|(position, record)| {
                let breakdown = self.score(record, filter);
                RankedResult {
                    record,
                    position,
                    score: breakdown.total(),
                    breakdown,
                }
            })
            .collect();

        let candidates = results.len();

        // sort_by is stable, so ties keep catalog order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);

        tracing::debug!(
            catalog = records.len(),
            candidates,
            returned = results.len(),
            "Ranked candidates"
        );

        Ok(Ranking {
            results,
            candidates,
        })
    }
}

/// Free-function form of [`Scorer::score_and_rank`]
pub fn score_and_rank<'a>(
    records: &'a [CatalogRecord],
    filter: &StructuredFilter,
    weights: &ScoreWeights,
    top_k: usize,
) -> Result<Vec<RankedResult<'a>>> {
    Scorer::new(*weights).score_and_rank(records, filter, top_k)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(id: u64, article_type: &str, colours: &[&str]) -> CatalogRecord {
        CatalogRecord {
            id,
            gender: "women".to_string(),
            article_type: article_type.to_string(),
            usage: "casual".to_string(),
            season: "summer".to_string(),
            base_colour: colours.iter().map(|c| c.to_string()).collect(),
            material: None,
            display_name: None,
            image_path: format!("images/{}.jpg", id),
        }
    }

    fn example_catalog() -> Vec<CatalogRecord> {
        vec![record(1, "dress", &["red"]), record(2, "jeans", &["blue"])]
    }

    fn example_weights() -> ScoreWeights {
        ScoreWeights::new(0.4, 0.3, 0.3, 0.0)
    }

    #[test]
    fn test_color_filter_example() {
        let catalog = example_catalog();
        let filter = StructuredFilter::new().with_colors(["red"]);

        let results = score_and_rank(&catalog, &filter, &example_weights(), 5).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.id, 1);
        assert!((results[0].breakdown.color - 0.4).abs() < 1e-6);
        assert!((results[0].score - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_empty_filter_keeps_catalog_order() {
        let catalog = example_catalog();
        let results =
            score_and_rank(&catalog, &StructuredFilter::new(), &example_weights(), 5).unwrap();

        let ids: Vec<u64> = results.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(results.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_every_result_matches_requested_colour() {
        let catalog = vec![
            record(1, "dress", &["red", "white"]),
            record(2, "jeans", &["blue"]),
            record(3, "shirt", &["white"]),
            record(4, "skirt", &["black"]),
        ];
        let filter = StructuredFilter::new()
            .with_colors(["white", "black"])
            .with_styles(["shirt"]);

        let results = score_and_rank(&catalog, &filter, &ScoreWeights::default(), 10).unwrap();

        assert_eq!(results.len(), 3);
        for r in &results {
            assert!(r.record.base_colour.iter().any(|c| filter.colors.contains(c)));
        }
        assert_eq!(results[0].record.id, 3);
    }

    #[test]
    fn test_ranking_is_deterministic_with_ties() {
        let catalog = vec![
            record(10, "dress", &["red"]),
            record(11, "jeans", &["red"]),
            record(12, "dress", &["red"]),
        ];
        let filter = StructuredFilter::new().with_colors(["red"]).with_styles(["dress"]);
        let scorer = Scorer::new(ScoreWeights::default());

        let first = scorer.score_and_rank(&catalog, &filter, 3).unwrap();
        let second = scorer.score_and_rank(&catalog, &filter, 3).unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].score, first[1].score);
        let ids: Vec<u64> = first.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![10, 12, 11]);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let catalog: Vec<CatalogRecord> =
            (0..20).map(|i| record(i, "dress", &["red"])).collect();
        let ranking = Scorer::default()
            .rank(&catalog, &StructuredFilter::new(), 5)
            .unwrap();
        assert_eq!(ranking.results.len(), 5);
        assert_eq!(ranking.results[4].position, 4);
        assert_eq!(ranking.candidates, 20);
    }

    #[test]
    fn test_candidate_count_is_post_filter() {
        let mut catalog = example_catalog();
        catalog.push(record(3, "shirt", &["red", "white"]));
        let filter = StructuredFilter::new().with_colors(["red"]);

        let ranking = Scorer::default().rank(&catalog, &filter, 1).unwrap();

        assert_eq!(ranking.candidates, 2);
        assert_eq!(ranking.results.len(), 1);
    }

    #[test]
    fn test_empty_catalog_and_overconstrained_filter() {
        let filter = StructuredFilter::new().with_colors(["purple"]);
        assert!(score_and_rank(&[], &filter, &ScoreWeights::default(), 3)
            .unwrap()
            .is_empty());

        let catalog = example_catalog();
        assert!(score_and_rank(&catalog, &filter, &ScoreWeights::default(), 3)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let catalog = example_catalog();
        assert!(matches!(
            score_and_rank(&catalog, &StructuredFilter::new(), &ScoreWeights::default(), 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_material_and_usage_are_soft() {
        let mut linen = record(1, "shirt", &["white"]);
        linen.material = Some("linen blend".to_string());
        let mut formal = record(2, "shirt", &["white"]);
        formal.usage = "formal".to_string();
        let catalog = vec![record(0, "shirt", &["white"]), linen, formal];

        let filter = StructuredFilter::new()
            .with_materials(["linen"])
            .with_usage(Some("formal"));
        let weights = ScoreWeights::new(0.4, 0.3, 0.3, 0.2);
        let results = score_and_rank(&catalog, &filter, &weights, 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].record.id, 1);
        assert!((results[0].breakdown.material - 0.3).abs() < 1e-6);
        assert_eq!(results[1].record.id, 2);
        assert!((results[1].breakdown.usage - 0.2).abs() < 1e-6);
        assert_eq!(results[2].score, 0.0);
    }

    #[test]
    fn test_gender_and_season_constraints() {
        let mut men = record(1, "shirt", &["white"]);
        men.gender = "men".to_string();
        let mut unisex = record(2, "shirt", &["white"]);
        unisex.gender = "unisex".to_string();
        let mut winter = record(3, "shirt", &["white"]);
        winter.season = "winter".to_string();
        let catalog = vec![record(0, "shirt", &["white"]), men, unisex, winter];

        let filter = StructuredFilter::new()
            .with_gender(Some("women"))
            .with_season(Some("summer"));
        let results = score_and_rank(&catalog, &filter, &ScoreWeights::default(), 10).unwrap();

        let ids: Vec<u64> = results.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_top_term() {
        let breakdown = ScoreBreakdown {
            color: 0.2,
            style: 0.3,
            material: 0.0,
            usage: 0.3,
        };
        assert_eq!(breakdown.top_term(), Some(ScoreTerm::Style));
        assert_eq!(ScoreBreakdown::default().top_term(), None);
    }
}
