//! Catalog store
//!
//! An in-memory, read-only table of product records. Readers take a cheap
//! `Arc` snapshot; a reload swaps the whole table at once so a concurrent
//! reader never observes a partially replaced catalog.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A single recommendable clothing item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: u64,
    pub gender: String,
    pub article_type: String,
    pub usage: String,
    pub season: String,
    pub base_colour: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub image_path: String,
}

impl CatalogRecord {
    /// Image file name used in generated text, e.g. `1234.jpg`
    pub fn image_reference(&self) -> String {
        format!("{}.jpg", self.id)
    }

    /// Check that every key attribute is present and normalized
    pub fn is_valid(&self) -> bool {
        let key_fields = [&self.gender, &self.article_type, &self.usage, &self.season];
        key_fields.iter().all(|f| is_normalized(f))
            && !self.base_colour.is_empty()
            && self.base_colour.iter().all(|c| is_normalized(c))
    }

    /// Whether the record carries the given color tag
    pub fn has_colour(&self, colour: &str) -> bool {
        self.base_colour.iter().any(|c| c == colour)
    }
}

fn is_normalized(value: &str) -> bool {
    !value.is_empty() && value.trim() == value && !value.chars().any(char::is_uppercase)
}

/// Read-only catalog snapshot holder
#[derive(Debug, Default)]
pub struct CatalogStore {
    records: RwLock<Arc<[CatalogRecord]>>,
}

impl CatalogStore {
    /// Create a store from already-cleaned records.
    /// Records violating the key-field invariant are dropped.
    pub fn new(records: Vec<CatalogRecord>) -> Self {
        Self {
            records: RwLock::new(Self::admit(records)),
        }
    }

    /// Stable snapshot of all records in insertion order
    pub fn records(&self) -> Arc<[CatalogRecord]> {
        self.records.read().clone()
    }

    /// Atomically replace the whole snapshot
    pub fn replace(&self, records: Vec<CatalogRecord>) {
        let snapshot = Self::admit(records);
        *self.records.write() = snapshot;
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Look up a record by id
    pub fn get(&self, id: u64) -> Option<CatalogRecord> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    fn admit(records: Vec<CatalogRecord>) -> Arc<[CatalogRecord]> {
        let total = records.len();
        let mut seen = ahash::AHashSet::with_capacity(total);
        let kept: Vec<CatalogRecord> = records
            .into_iter()
            .filter(|r| r.is_valid() && seen.insert(r.id))
            .collect();

        if kept.len() != total {
            tracing::warn!(
                dropped = total - kept.len(),
                kept = kept.len(),
                "Dropped invalid or duplicate catalog records"
            );
        }

        kept.into()
    }
}
