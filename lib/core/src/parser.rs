//! Query parser
//!
//! Translates free text into a [`StructuredFilter`] by embedding the query,
//! searching the knowledge index, and unioning the attribute hints of every
//! neighbor closer than the threshold.

use crate::embedder::validate_encoder;
use crate::{Encoder, Error, KnowledgeIndex, Neighbor, Result, StructuredFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of neighbors to inspect per query
pub const DEFAULT_TOP_N: usize = 2;

/// Default acceptance threshold on squared L2 distance.
/// For unit vectors this accepts neighbors with cosine similarity above 0.5.
pub const DEFAULT_DISTANCE_THRESHOLD: f32 = 1.0;

/// Query parsing options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParserConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

fn default_threshold() -> f32 {
    DEFAULT_DISTANCE_THRESHOLD
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            threshold: DEFAULT_DISTANCE_THRESHOLD,
        }
    }
}

impl ParserConfig {
    pub fn validate(&self) -> Result<()> {
        check_arguments(self.top_n, self.threshold)
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Parsed filter together with the neighbors that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedQuery {
    pub filter: StructuredFilter,
    pub matches: Vec<Neighbor>,
}

/// Embeds queries and maps them onto attribute filters
#[derive(Clone)]
pub struct QueryParser {
    index: Arc<KnowledgeIndex>,
    encoder: Arc<dyn Encoder>,
}

impl std::fmt::Debug for QueryParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryParser")
            .field("encoder", &self.encoder.id())
            .field("index_entries", &self.index.len())
            .field("dim", &self.index.dim())
            .finish()
    }
}

impl QueryParser {
    /// Create a parser, validating that the encoder matches the index
    pub fn new(index: Arc<KnowledgeIndex>, encoder: Arc<dyn Encoder>) -> Result<Self> {
        validate_encoder(encoder.as_ref(), &index)?;
        Ok(Self { index, encoder })
    }

    pub fn index(&self) -> &KnowledgeIndex {
        &self.index
    }

    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    /// Parse a query into a structured filter.
    ///
    /// Only neighbors with `distance < threshold` contribute. An empty filter
    /// is a valid outcome and means "no attribute constraint".
    pub fn parse_query(&self, query: &str, top_n: usize, threshold: f32) -> Result<StructuredFilter> {
        self.parse_query_with_matches(query, top_n, threshold)
            .map(|parsed| parsed.filter)
    }

    /// Like [`QueryParser::parse_query`] but also returns the accepted neighbors
    pub fn parse_query_with_matches(
        &self,
        query: &str,
        top_n: usize,
        threshold: f32,
    ) -> Result<ParsedQuery> {
        check_arguments(top_n, threshold)?;

        let embedding = self.encoder.encode(query);
        let neighbors = self.index.search(&embedding, top_n)?;

        let mut filter = StructuredFilter::new();
        let mut matches = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            if neighbor.distance >= threshold {
                continue;
            }
            let entry = self.index.entry(neighbor.index).ok_or_else(|| {
                Error::Internal(format!("neighbor {} outside the index", neighbor.index))
            })?;
            filter.absorb(entry);
            matches.push(neighbor);
        }

        tracing::debug!(
            accepted = matches.len(),
            colors = filter.colors.len(),
            styles = filter.styles.len(),
            materials = filter.materials.len(),
            "Parsed query"
        );

        Ok(ParsedQuery { filter, matches })
    }
}

fn check_arguments(top_n: usize, threshold: f32) -> Result<()> {
    if top_n == 0 {
        return Err(Error::InvalidArgument("topN must be positive".into()));
    }
    if !threshold.is_finite() {
        return Err(Error::InvalidArgument("threshold must be a finite number".into()));
    }
    Ok(())
}
