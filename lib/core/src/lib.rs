//! # Tailor Core
//!
//! Core library for the Tailor clothing recommender.
//!
//! This crate provides the read-only data structures and the query side of
//! the hybrid retrieval engine:
//!
//! - [`CatalogStore`] - Atomically replaceable snapshot of [`CatalogRecord`]s
//! - [`KnowledgeIndex`] - Exact L2 index over [`KnowledgeEntry`] attribute hints
//! - [`Encoder`] - Text embedding, validated against the index it queries
//! - [`QueryParser`] - Free text to [`StructuredFilter`]
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tailor_core::{Encoder, HashingEncoder, KnowledgeEntry, KnowledgeIndex, QueryParser};
//!
//! let encoder = Arc::new(HashingEncoder::new(64).unwrap());
//! let mut index = KnowledgeIndex::new(encoder.dim(), encoder.id());
//! index
//!     .add(KnowledgeEntry::new(encoder.encode("red summer dress")).with_colors(["red"]))
//!     .unwrap();
//!
//! let parser = QueryParser::new(Arc::new(index), encoder).unwrap();
//! let filter = parser.parse_query("red summer dress", 2, 1.0).unwrap();
//! assert!(filter.colors.contains("red"));
//! ```

pub mod catalog;
pub mod embedder;
pub mod error;
pub mod filter;
pub mod knowledge;
pub mod palette;
pub mod parser;
pub mod vector;

pub use catalog::{CatalogRecord, CatalogStore};
pub use embedder::{validate_encoder, Encoder, HashingEncoder, DEFAULT_ENCODER_DIM};
pub use error::{Error, Result};
pub use filter::StructuredFilter;
pub use knowledge::{KnowledgeEntry, KnowledgeIndex, Neighbor};
pub use palette::skin_tone_palette;
pub use parser::{ParsedQuery, ParserConfig, QueryParser, DEFAULT_DISTANCE_THRESHOLD, DEFAULT_TOP_N};
pub use vector::Vector;
