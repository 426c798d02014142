//! Service configuration
//!
//! Loaded once from a JSON file and validated before anything else starts.

use crate::engine::DEFAULT_MAX_QUERY_CHARS;
use anyhow::{Context, Result as AnyResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tailor_core::{Error, ParserConfig, Result, DEFAULT_ENCODER_DIM};
use tailor_generation::{BackendConfig, GenerationConfig};
use tailor_scoring::ScoreWeights;

/// Everything the service needs to start serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    pub catalog_path: PathBuf,
    pub images_dir: PathBuf,
    pub knowledge_path: PathBuf,
    /// Dimension of the hashing encoder; must match the knowledge snapshot
    #[serde(default = "default_encoder_dim")]
    pub encoder_dim: usize,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub weights: ScoreWeights,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
    /// Longest accepted free-text query, in characters
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Generation is disabled when no backend is configured
    #[serde(default)]
    pub backend: Option<BackendConfig>,
}

fn default_encoder_dim() -> usize {
    DEFAULT_ENCODER_DIM
}

fn default_max_top_k() -> usize {
    50
}

fn default_max_query_chars() -> usize {
    DEFAULT_MAX_QUERY_CHARS
}

impl ServiceConfig {
    pub fn new(
        catalog_path: impl Into<PathBuf>,
        images_dir: impl Into<PathBuf>,
        knowledge_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            images_dir: images_dir.into(),
            knowledge_path: knowledge_path.into(),
            encoder_dim: default_encoder_dim(),
            parser: ParserConfig::default(),
            weights: ScoreWeights::default(),
            max_top_k: default_max_top_k(),
            max_query_chars: default_max_query_chars(),
            generation: GenerationConfig::default(),
            backend: None,
        }
    }

    /// Read and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> AnyResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn generation_enabled(&self) -> bool {
        self.backend.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.encoder_dim == 0 {
            return Err(Error::InvalidConfig("encoderDim must be positive".into()));
        }
        if self.max_top_k == 0 {
            return Err(Error::InvalidConfig("maxTopK must be positive".into()));
        }
        if self.max_query_chars == 0 {
            return Err(Error::InvalidConfig("maxQueryChars must be positive".into()));
        }
        self.parser.validate()?;
        self.weights
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        self.generation.validate().map_err(Error::InvalidConfig)?;

        if let Some(backend) = &self.backend {
            if backend.api_base.trim().is_empty() || backend.model.trim().is_empty() {
                return Err(Error::InvalidConfig(
                    "backend requires apiBase and model".into(),
                ));
            }
        }
        Ok(())
    }
}
