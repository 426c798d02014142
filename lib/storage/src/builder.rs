//! Offline knowledge builder
//!
//! Turns curated advice entries into a knowledge index snapshot. Text is
//! cleaned, attribute tags are normalized, and each entry is embedded from
//! its text plus scene tags with the configured encoder.

use crate::snapshot::{save_index, SnapshotHeader};
use crate::structurer::{load_conversations, KnowledgeStructurer};
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tailor_core::{Encoder, KnowledgeEntry, KnowledgeIndex, Vector};

/// A curated entry as written by hand or extracted from conversations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeSource {
    pub text: String,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub scene_tags: Vec<String>,
}

fn corrections() -> &'static [(Regex, &'static str)] {
    static CORRECTIONS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    CORRECTIONS.get_or_init(|| {
        [
            (r"(?i)\bstealth\s*dress", "sheath dress"),
            (r"(?i)\blinewr\b", "linen"),
            (r"(?i)\bwisawake\b", "washing"),
            (r"(?i)\bblender\b", "blended fabric"),
            (r":--(.*?)--:", "[$1]"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| (Regex::new(pattern).expect("valid correction pattern"), replacement))
        .collect()
    })
}

/// Fix known misspellings and collapse whitespace
pub fn clean_text(text: &str) -> String {
    let mut cleaned = text.to_string();
    for (pattern, replacement) in corrections() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clean_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|t| clean_text(t).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Read a JSON array of knowledge sources
pub fn load_sources(path: impl AsRef<Path>) -> Result<Vec<KnowledgeSource>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read knowledge sources {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse knowledge sources {}", path.display()))
}

/// Embeds cleaned knowledge sources into an index
pub struct KnowledgeBuilder {
    encoder: Arc<dyn Encoder>,
}

impl KnowledgeBuilder {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    /// Build an index in source order, skipping entries whose text is blank
    pub fn build(&self, sources: &[KnowledgeSource]) -> tailor_core::Result<KnowledgeIndex> {
        let mut texts = Vec::with_capacity(sources.len());
        let mut entries = Vec::with_capacity(sources.len());

        for source in sources {
            let text = clean_text(&source.text);
            if text.is_empty() {
                tracing::warn!("Skipping knowledge source with empty text");
                continue;
            }
            let scene_tags = clean_tags(&source.scene_tags);

            let mut embed_text = text.clone();
            for tag in &scene_tags {
                embed_text.push(' ');
                embed_text.push_str(tag);
            }
            texts.push(embed_text);

            let mut entry = KnowledgeEntry::new(Vector::zeros(0))
                .with_colors(clean_tags(&source.colors))
                .with_styles(clean_tags(&source.styles))
                .with_materials(clean_tags(&source.materials))
                .with_source_text(text);
            entry.scene_tags = scene_tags;
            entries.push(entry);
        }

        let embeddings = self.encoder.encode_batch(&texts);
        for (entry, embedding) in entries.iter_mut().zip(embeddings) {
            entry.embedding = embedding;
        }

        KnowledgeIndex::from_entries(self.encoder.dim(), self.encoder.id(), entries)
    }

    /// Read sources from `input`, build the index and write it to `output`
    pub fn build_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<SnapshotHeader> {
        let sources = load_sources(input)?;
        let index = self.build(&sources)?;
        self.save(&index, sources.len(), output)
    }

    /// Structure raw conversations from `input` through `structurer`, then
    /// build and write the index as [`KnowledgeBuilder::build_file`] does
    pub async fn build_conversations_file(
        &self,
        structurer: &KnowledgeStructurer,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> Result<SnapshotHeader> {
        let conversations = load_conversations(input)?;
        let sources = structurer.structure_all(&conversations).await;
        let index = self.build(&sources)?;
        self.save(&index, sources.len(), output)
    }

    fn save(&self, index: &KnowledgeIndex, sources: usize, output: impl AsRef<Path>) -> Result<SnapshotHeader> {
        tracing::info!(
            sources,
            entries = index.len(),
            encoder = self.encoder.id(),
            "Knowledge index built"
        );
        save_index(output, index, self.encoder.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::load_index;
    use tailor_core::{HashingEncoder, QueryParser};

    fn encoder() -> Arc<dyn Encoder> {
        Arc::new(HashingEncoder::new(64).unwrap())
    }

    fn sources() -> Vec<KnowledgeSource> {
        vec![
            KnowledgeSource {
                text: "A  red Stealth dress  works for an evening   wedding".to_string(),
                colors: vec!["Red".to_string(), " red ".to_string()],
                styles: vec!["Sheath Dress".to_string()],
                materials: vec!["Silk".to_string()],
                scene_tags: vec!["Wedding".to_string(), "Evening".to_string()],
            },
            KnowledgeSource {
                text: "   ".to_string(),
                ..Default::default()
            },
            KnowledgeSource {
                text: "Breathable linewr shirts for hot office days".to_string(),
                materials: vec!["linen".to_string()],
                scene_tags: vec!["office".to_string()],
                ..Default::default()
            },
        ]
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  a   Stealth Dress\tin linewr "), "a sheath dress in linen");
        assert_eq!(clean_text(":--fit--: matters"), "[fit] matters");
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_build_cleans_and_skips_blank() {
        let index = KnowledgeBuilder::new(encoder()).build(&sources()).unwrap();

        assert_eq!(index.len(), 2);
        let first = index.entry(0).unwrap();
        assert_eq!(first.source_text, "A red sheath dress works for an evening wedding");
        assert_eq!(first.colors.len(), 1);
        assert!(first.colors.contains("red"));
        assert!(first.styles.contains("sheath dress"));
        assert!(first.scene_tags.contains("wedding"));
        assert_eq!(first.embedding.dim(), 64);
    }

    #[test]
    fn test_built_index_answers_queries() {
        let encoder = encoder();
        let index = Arc::new(KnowledgeBuilder::new(encoder.clone()).build(&sources()).unwrap());
        let parser = QueryParser::new(index, encoder).unwrap();

        let parsed = parser
            .parse_query_with_matches("red sheath dress for an evening wedding", 1, 10.0)
            .unwrap();
        assert_eq!(parsed.matches[0].index, 0);
        assert!(parsed.filter.colors.contains("red"));
    }

    #[test]
    fn test_build_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("knowledge.json");
        let output = dir.path().join("knowledge.bin");
        std::fs::write(&input, serde_json::to_string(&sources()).unwrap()).unwrap();

        let header = KnowledgeBuilder::new(encoder()).build_file(&input, &output).unwrap();
        assert_eq!(header.count, 2);

        let loaded = load_index(&output).unwrap();
        assert_eq!(loaded.encoder_id(), encoder().id());
    }

    struct CannedBackend;

    #[async_trait::async_trait]
    impl tailor_generation::GenerationBackend for CannedBackend {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, prompt: &str) -> tailor_generation::error::Result<String> {
            let request = if prompt.contains("wedding") {
                "Red sheath dress for an evening wedding"
            } else {
                "Linen shirts for hot office days"
            };
            Ok(format!(
                r#"{{"request": "{}", "colors": ["Red"], "sceneTags": ["Evening"]}}"#,
                request
            ))
        }
    }

    #[tokio::test]
    async fn test_build_from_conversations() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("conversations.txt");
        let output = dir.path().join("knowledge.bin");
        std::fs::write(&input, "What should I wear to an evening wedding?\nShirts for the office?\n").unwrap();

        let structurer = KnowledgeStructurer::new(
            Arc::new(CannedBackend),
            tailor_generation::GenerationConfig::default(),
        );
        let header = KnowledgeBuilder::new(encoder())
            .build_conversations_file(&structurer, &input, &output)
            .await
            .unwrap();
        assert_eq!(header.count, 2);

        let loaded = load_index(&output).unwrap();
        let first = loaded.entry(0).unwrap();
        assert_eq!(first.source_text, "Red sheath dress for an evening wedding");
        assert!(first.colors.contains("red"));
        assert!(first.scene_tags.contains("evening"));
    }
}
