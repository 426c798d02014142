//! Score weights
//!
//! Relative contribution of each scoring term. Weights are validated once at
//! startup and then shared read-only; they are not normalized and need not
//! sum to 1.0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scoring term
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreTerm {
    /// Overlap between record colors and requested colors
    Color,
    /// Fuzzy match of the article type against requested styles
    Style,
    /// Requested material found in the record's material
    Material,
    /// Requested usage found in the record's usage
    Usage,
}

impl ScoreTerm {
    pub const ALL: [ScoreTerm; 4] = [
        ScoreTerm::Color,
        ScoreTerm::Style,
        ScoreTerm::Material,
        ScoreTerm::Usage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreTerm::Color => "color",
            ScoreTerm::Style => "style",
            ScoreTerm::Material => "material",
            ScoreTerm::Usage => "usage",
        }
    }
}

impl fmt::Display for ScoreTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-term weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_color")]
    pub color: f32,
    /// Also accepted under the key `type`
    #[serde(default = "default_style", alias = "type")]
    pub style: f32,
    #[serde(default = "default_material")]
    pub material: f32,
    #[serde(default = "default_usage")]
    pub usage: f32,
}

fn default_color() -> f32 {
    0.4
}

fn default_style() -> f32 {
    0.3
}

fn default_material() -> f32 {
    0.3
}

fn default_usage() -> f32 {
    0.3
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            color: default_color(),
            style: default_style(),
            material: default_material(),
            usage: default_usage(),
        }
    }
}

impl ScoreWeights {
    pub fn new(color: f32, style: f32, material: f32, usage: f32) -> Self {
        Self {
            color,
            style,
            material,
            usage,
        }
    }

    /// Weight of a single term
    pub fn weight(&self, term: ScoreTerm) -> f32 {
        match term {
            ScoreTerm::Color => self.color,
            ScoreTerm::Style => self.style,
            ScoreTerm::Material => self.material,
            ScoreTerm::Usage => self.usage,
        }
    }

    /// Check that every weight is finite and non-negative
    pub fn validate(&self) -> Result<(), WeightsError> {
        for term in ScoreTerm::ALL {
            let weight = self.weight(term);
            if !weight.is_finite() {
                return Err(WeightsError::NotFinite(term));
            }
            if weight < 0.0 {
                return Err(WeightsError::NegativeWeight(term));
            }
        }
        Ok(())
    }

    /// Highest score any record can reach with these weights
    pub fn max_score(&self) -> f32 {
        ScoreTerm::ALL.iter().map(|t| self.weight(*t)).sum()
    }
}

/// Errors that can occur during weight validation
#[derive(Debug, Clone, thiserror::Error)]
pub enum WeightsError {
    #[error("Weight for '{0}' is negative")]
    NegativeWeight(ScoreTerm),

    #[error("Weight for '{0}' is not a finite number")]
    NotFinite(ScoreTerm),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = ScoreWeights::default();
        assert!(weights.validate().is_ok());
        assert_eq!(weights.weight(ScoreTerm::Color), 0.4);
        assert!((weights.max_score() - 1.3).abs() < 1e-6);
    }

    #[test]
    fn test_negative_weight_error() {
        let weights = ScoreWeights::new(0.4, -0.1, 0.3, 0.0);
        assert!(matches!(
            weights.validate(),
            Err(WeightsError::NegativeWeight(ScoreTerm::Style))
        ));
    }

    #[test]
    fn test_non_finite_weight_error() {
        let weights = ScoreWeights::new(f32::NAN, 0.3, 0.3, 0.0);
        assert!(matches!(
            weights.validate(),
            Err(WeightsError::NotFinite(ScoreTerm::Color))
        ));
    }

    #[test]
    fn test_type_key_is_alias_for_style() {
        let weights: ScoreWeights =
            serde_json::from_str(r#"{"color": 0.4, "type": 0.3, "material": 0.3}"#).unwrap();
        assert_eq!(weights.style, 0.3);
        assert_eq!(weights.usage, 0.3);
    }
}
