//! Knowledge index
//!
//! A flat (exact) nearest-neighbor index over curated knowledge entries.
//! Each entry owns its embedding, so entry `i` and index vector `i` are the
//! same object and cannot drift apart across rebuilds.

use crate::{Error, Result, Vector};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Below this many entries the distance pass runs on the calling thread
const PARALLEL_SEARCH_THRESHOLD: usize = 2_048;

/// A curated knowledge-base entry with extracted attribute hints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub embedding: Vector,
    #[serde(default)]
    pub colors: BTreeSet<String>,
    #[serde(default)]
    pub styles: BTreeSet<String>,
    #[serde(default)]
    pub materials: BTreeSet<String>,
    #[serde(default)]
    pub scene_tags: BTreeSet<String>,
    #[serde(default)]
    pub source_text: String,
}

impl KnowledgeEntry {
    pub fn new(embedding: Vector) -> Self {
        Self {
            embedding,
            colors: BTreeSet::new(),
            styles: BTreeSet::new(),
            materials: BTreeSet::new(),
            scene_tags: BTreeSet::new(),
            source_text: String::new(),
        }
    }

    #[must_use]
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = styles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = materials.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_source_text(mut self, text: impl Into<String>) -> Self {
        self.source_text = text.into();
        self
    }
}

/// A search hit: position in the index and its squared L2 distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f32,
}

/// Read-only exact L2 index
#[derive(Debug, Clone)]
pub struct KnowledgeIndex {
    dim: usize,
    encoder_id: String,
    entries: Vec<KnowledgeEntry>,
}

impl KnowledgeIndex {
    pub fn new(dim: usize, encoder_id: impl Into<String>) -> Self {
        Self {
            dim,
            encoder_id: encoder_id.into(),
            entries: Vec::new(),
        }
    }

    /// Build an index from entries, rejecting any with the wrong dimension
    pub fn from_entries(
        dim: usize,
        encoder_id: impl Into<String>,
        entries: Vec<KnowledgeEntry>,
    ) -> Result<Self> {
        let mut index = Self::new(dim, encoder_id);
        index.entries.reserve(entries.len());
        for entry in entries {
            index.add(entry)?;
        }
        Ok(index)
    }

    /// Append an entry; its position becomes `len() - 1`
    pub fn add(&mut self, entry: KnowledgeEntry) -> Result<usize> {
        if entry.embedding.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: entry.embedding.dim(),
            });
        }
        self.entries.push(entry);
        Ok(self.entries.len() - 1)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn encoder_id(&self) -> &str {
        &self.encoder_id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[KnowledgeEntry] {
        &self.entries
    }

    /// k-nearest-neighbor search ordered by ascending distance.
    /// Equal distances keep the lower index first.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<Neighbor>> {
        if query.dim() != self.dim {
            return Err(Error::InvalidDimension {
                expected: self.dim,
                actual: query.dim(),
            });
        }
        if k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let distance = |(index, entry): (usize, &KnowledgeEntry)| Neighbor {
            index,
            distance: entry.embedding.squared_l2_distance(query),
        };

        let mut neighbors: Vec<Neighbor> = if self.entries.len() >= PARALLEL_SEARCH_THRESHOLD {
            self.entries.par_iter().enumerate().map(distance).collect()
        } else {
            self.entries.iter().enumerate().map(distance).collect()
        };

        neighbors.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.index.cmp(&b.index))
        });
        neighbors.truncate(k);
        Ok(neighbors)
    }
}
