//! # Tailor Scoring
//!
//! Weighted multi-attribute scoring of catalog records against a
//! [`StructuredFilter`](tailor_core::StructuredFilter).
//!
//! ## Features
//!
//! - **Hard pre-filter**: requested colors (and optional gender/season) select candidates
//! - **Soft terms**: fuzzy style match, material and usage containment add to the score
//! - **Stable ranking**: equal scores keep catalog order, so output is reproducible
//! - **Explainability**: per-term contribution breakdown for every result
//!
//! ## Example
//!
//! ```rust
//! use tailor_core::{CatalogRecord, StructuredFilter};
//! use tailor_scoring::{score_and_rank, ScoreWeights};
//!
//! let catalog = vec![CatalogRecord {
//!     id: 1,
//!     gender: "women".into(),
//!     article_type: "dress".into(),
//!     usage: "casual".into(),
//!     season: "summer".into(),
//!     base_colour: vec!["red".into()],
//!     material: None,
//!     display_name: None,
//!     image_path: "images/1.jpg".into(),
//! }];
//!
//! let filter = StructuredFilter::new().with_colors(["red"]);
//! let ranked = score_and_rank(&catalog, &filter, &ScoreWeights::default(), 5).unwrap();
//! assert_eq!(ranked[0].record.id, 1);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Catalog   │────>│ Pre-filter  │────>│   Scorer    │
//! │  snapshot   │     │  (colors)   │     │  (weights)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                         ┌─────────────┐
//!                                         │   Explain   │
//!                                         │  (results)  │
//!                                         └─────────────┘
//! ```

pub mod explain;
pub mod rank;
pub mod similarity;
pub mod weights;

pub use explain::{ExplainedResult, RankingStats};
pub use rank::{score_and_rank, RankedResult, Ranking, ScoreBreakdown, Scorer};
pub use weights::{ScoreTerm, ScoreWeights, WeightsError};
