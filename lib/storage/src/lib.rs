//! Tailor Storage - files that feed the recommendation pipeline
//!
//! - Catalog loading and cleaning from JSON or JSON lines
//! - Knowledge index snapshots with checksums and atomic replacement
//! - The offline builder that embeds curated knowledge into a snapshot
//! - Structuring raw advice conversations into knowledge through a generation backend

pub mod builder;
pub mod catalog_loader;
pub mod snapshot;
pub mod structurer;

pub use builder::{clean_text, load_sources, KnowledgeBuilder, KnowledgeSource};
pub use catalog_loader::{load_catalog, LoadReport, RawCatalogRow};
pub use snapshot::{
    encoder_fingerprint, load_index, load_index_for, read_header, save_index, SnapshotHeader,
    SNAPSHOT_FORMAT_VERSION,
};
pub use structurer::{load_conversations, parse_structured, KnowledgeStructurer};
