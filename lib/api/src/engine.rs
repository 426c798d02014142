//! Request pipeline: parse, score and rank, then optionally explain

use crate::config::ServiceConfig;
use crate::models::{validate_top_k, RecommendResponse, StructuredRecommendRequest, TextRecommendRequest};
use anyhow::{Context, Result as AnyResult};
use std::sync::Arc;
use tailor_core::{CatalogStore, Encoder, HashingEncoder, ParserConfig, QueryParser, Result, StructuredFilter};
use tailor_generation::{ExplanationGenerator, HttpBackend, UserContext};
use tailor_scoring::{ExplainedResult, RankingStats, Scorer};
use tokio_util::sync::CancellationToken;

/// Query length cap used until a config says otherwise
pub const DEFAULT_MAX_QUERY_CHARS: usize = 1_000;

/// Shared, read-only state used by every request
#[derive(Debug)]
pub struct RecommendationEngine {
    catalog: Arc<CatalogStore>,
    parser: QueryParser,
    parser_config: ParserConfig,
    scorer: Scorer,
    max_top_k: usize,
    max_query_chars: usize,
    generator: Option<ExplanationGenerator>,
}

impl RecommendationEngine {
    pub fn new(
        catalog: Arc<CatalogStore>,
        parser: QueryParser,
        parser_config: ParserConfig,
        scorer: Scorer,
        max_top_k: usize,
    ) -> Self {
        Self {
            catalog,
            parser,
            parser_config,
            scorer,
            max_top_k,
            max_query_chars: DEFAULT_MAX_QUERY_CHARS,
            generator: None,
        }
    }

    #[must_use]
    pub fn with_max_query_chars(mut self, max_query_chars: usize) -> Self {
        self.max_query_chars = max_query_chars;
        self
    }

    #[must_use]
    pub fn with_generator(mut self, generator: ExplanationGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Load the catalog and knowledge snapshot and wire up the pipeline
    pub fn from_config(config: &ServiceConfig) -> AnyResult<Self> {
        let records = tailor_storage::load_catalog(&config.catalog_path, &config.images_dir)?;
        let catalog = Arc::new(CatalogStore::new(records));

        let encoder: Arc<dyn Encoder> = Arc::new(HashingEncoder::new(config.encoder_dim)?);
        let index = Arc::new(tailor_storage::load_index_for(
            &config.knowledge_path,
            encoder.as_ref(),
        )?);
        let parser = QueryParser::new(index, encoder)
            .context("Knowledge snapshot was built with a different encoder")?;

        let mut engine = Self::new(
            catalog,
            parser,
            config.parser,
            Scorer::new(config.weights),
            config.max_top_k,
        )
        .with_max_query_chars(config.max_query_chars);

        if let Some(backend_config) = &config.backend {
            let backend = HttpBackend::new(backend_config.clone())
                .context("Failed to create generation backend")?;
            tracing::info!(url = backend.url(), model = %backend_config.model, "Generation enabled");
            engine = engine.with_generator(ExplanationGenerator::new(
                Arc::new(backend),
                config.generation.clone(),
            ));
        } else {
            tracing::info!("Generation disabled: no backend configured");
        }

        Ok(engine)
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn parser(&self) -> &QueryParser {
        &self.parser
    }

    pub fn generation_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Free-text recommendation
    pub async fn recommend_text(
        &self,
        request: &TextRecommendRequest,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse> {
        let top_k = validate_top_k(request.top_k, self.max_top_k)?;
        request.validate(self.max_query_chars)?;
        let parsed = self.parser.parse_query_with_matches(
            &request.query,
            self.parser_config.top_n,
            self.parser_config.threshold,
        )?;

        let mut user = request.user_context.clone().unwrap_or_default();
        user.query = Some(request.query.clone());
        if user.gender.is_none() {
            user.gender = request.gender.clone();
        }
        if user.season.is_none() {
            user.season = request.season.clone();
        }

        let filter = parsed
            .filter
            .with_gender(request.gender.as_deref())
            .with_season(request.season.as_deref())
            .with_skin_tone(user.skin_tone.as_deref());

        let mut response = self
            .respond(filter, top_k, request.explain, &user, cancel)
            .await?;
        response.knowledge_matches = parsed.matches;
        Ok(response)
    }

    /// Attribute-based recommendation
    pub async fn recommend_structured(
        &self,
        request: &StructuredRecommendRequest,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse> {
        let top_k = validate_top_k(request.top_k, self.max_top_k)?;
        request.validate()?;
        self.respond(
            request.filter(),
            top_k,
            request.explain,
            &request.user_context(),
            cancel,
        )
        .await
    }

    async fn respond(
        &self,
        filter: StructuredFilter,
        top_k: usize,
        explain: bool,
        user: &UserContext,
        cancel: &CancellationToken,
    ) -> Result<RecommendResponse> {
        let records = self.catalog.records();
        let ranking = self.scorer.rank(&records, &filter, top_k)?;
        let ranked = ranking.results;
        let stats = RankingStats::compute(&ranked, ranking.candidates);

        let explanation = match (&self.generator, explain) {
            (Some(generator), true) => {
                Some(generator.generate_with_cancel(&ranked, user, cancel).await)
            }
            (None, true) => {
                tracing::debug!("Explanation requested but generation is disabled");
                None
            }
            _ => None,
        };

        tracing::info!(
            results = ranked.len(),
            best_score = stats.best_score,
            explained = explanation.is_some(),
            "Recommendation served"
        );

        Ok(RecommendResponse {
            recommendations: ExplainedResult::from_ranked_list(&ranked),
            filter,
            stats,
            knowledge_matches: Vec::new(),
            explanation,
        })
    }
}
