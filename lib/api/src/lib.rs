//! Tailor API - configuration, service state and the REST surface
//!
//! Endpoints:
//! - `POST /recommend` free-text recommendation
//! - `POST /recommend/structured` attribute-based recommendation
//! - `GET /healthz` liveness
//! - `GET /readyz` readiness

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod models;
pub mod rest;

pub use config::ServiceConfig;
pub use context::{Readiness, ServiceContext};
pub use engine::{RecommendationEngine, DEFAULT_MAX_QUERY_CHARS};
pub use error::ApiError;
pub use models::{
    validate_top_k, ReadinessResponse, RecommendResponse, StructuredRecommendRequest,
    TextRecommendRequest, DEFAULT_TOP_K, MAX_ATTRIBUTE_CHARS, MAX_REQUESTED_COLOURS,
};
pub use rest::{routes, RestApi};
