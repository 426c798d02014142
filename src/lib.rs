//! # Tailor
//!
//! A hybrid retrieval-and-scoring clothing recommender.
//!
//! A free-text request is embedded and matched against a curated knowledge
//! index; the nearest entries contribute color, style and material hints
//! that become a structured filter. Catalog items are pre-filtered by color,
//! scored with weighted fuzzy and substring matches, and ranked
//! deterministically. An optional generation step turns the top items into
//! a natural-language recommendation, degrading gracefully when the model is
//! unavailable.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! tailor build-knowledge --input data/knowledge.json --output data/knowledge.bin
//! tailor serve --config tailor.json --http-port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use std::sync::Arc;
//! use tailor::prelude::*;
//!
//! let encoder: Arc<dyn Encoder> = Arc::new(HashingEncoder::new(64).unwrap());
//! let sources = vec![KnowledgeSource {
//!     text: "a red dress for a summer wedding".to_string(),
//!     colors: vec!["red".to_string()],
//!     styles: vec!["dress".to_string()],
//!     ..Default::default()
//! }];
//! let index = KnowledgeBuilder::new(encoder.clone()).build(&sources).unwrap();
//! let parser = QueryParser::new(Arc::new(index), encoder).unwrap();
//!
//! let filter = parser.parse_query("a red dress for a summer wedding", 2, 1.0).unwrap();
//! assert!(filter.colors.contains("red"));
//! ```
//!
//! ## Crate Structure
//!
//! - `tailor-core` - catalog store, knowledge index, encoder, query parser
//! - `tailor-scoring` - candidate filtering, weighted scoring, ranking
//! - `tailor-storage` - catalog loading, knowledge snapshots, knowledge builder
//! - `tailor-generation` - prompting, retries and image-reference extraction
//! - `tailor-api` - service configuration, readiness and the REST API

// Re-export core types
pub use tailor_core::{
    CatalogRecord, CatalogStore, Encoder, Error, HashingEncoder, KnowledgeEntry, KnowledgeIndex,
    Neighbor, ParserConfig, QueryParser, Result, StructuredFilter, Vector,
};

// Re-export scoring
pub use tailor_scoring::{
    score_and_rank, ExplainedResult, RankedResult, RankingStats, ScoreBreakdown, ScoreWeights,
    Scorer,
};

// Re-export storage
pub use tailor_storage::{
    load_catalog, load_index, load_index_for, save_index, KnowledgeBuilder, KnowledgeSource,
};

// Re-export generation
pub use tailor_generation::{
    extract_image_references, Explanation, ExplanationGenerator, GenerationBackend,
    GenerationConfig, GenerationStatus, UserContext,
};

// Re-export API
pub use tailor_api::{RecommendationEngine, RestApi, ServiceConfig, ServiceContext};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        score_and_rank, CatalogRecord, CatalogStore, Encoder, Error, Explanation,
        ExplanationGenerator, HashingEncoder, KnowledgeBuilder, KnowledgeIndex, KnowledgeSource,
        QueryParser, RankedResult, Result, ScoreWeights, Scorer, StructuredFilter, UserContext,
    };
}
