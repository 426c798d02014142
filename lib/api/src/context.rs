//! Process-wide service state with a readiness gate
//!
//! The engine is installed exactly once after startup loading finishes.
//! Until then every request path fails with `NotReady`.

use crate::engine::RecommendationEngine;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use tailor_core::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Startup progress as reported by `/readyz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Loading,
    Ready,
    Failed(String),
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Readiness::Loading => "loading",
            Readiness::Ready => "ready",
            Readiness::Failed(_) => "failed",
        }
    }
}

#[derive(Debug)]
pub struct ServiceContext {
    engine: OnceLock<Arc<RecommendationEngine>>,
    readiness: RwLock<Readiness>,
    shutdown: CancellationToken,
}

impl Default for ServiceContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceContext {
    /// A context that is still loading
    pub fn new() -> Self {
        Self {
            engine: OnceLock::new(),
            readiness: RwLock::new(Readiness::Loading),
            shutdown: CancellationToken::new(),
        }
    }

    /// A context that is ready immediately
    pub fn with_engine(engine: RecommendationEngine) -> Self {
        Self {
            engine: OnceLock::from(Arc::new(engine)),
            readiness: RwLock::new(Readiness::Ready),
            shutdown: CancellationToken::new(),
        }
    }

    /// Install the engine and mark the service ready. Fails if one is
    /// already installed.
    pub fn install(&self, engine: RecommendationEngine) -> Result<()> {
        self.engine
            .set(Arc::new(engine))
            .map_err(|_| Error::Internal("engine already installed".into()))?;
        *self.readiness.write() = Readiness::Ready;
        tracing::info!("Service ready");
        Ok(())
    }

    /// Record a startup failure; the service stays unready
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::error!(%reason, "Service failed to load");
        *self.readiness.write() = Readiness::Failed(reason);
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.read().clone()
    }

    pub fn is_ready(&self) -> bool {
        self.engine.get().is_some()
    }

    /// The engine, or `NotReady` while loading or after a failed load
    pub fn engine(&self) -> Result<Arc<RecommendationEngine>> {
        if let Some(engine) = self.engine.get() {
            return Ok(engine.clone());
        }
        let reason = match self.readiness() {
            Readiness::Failed(reason) => format!("startup failed: {}", reason),
            _ => "still loading".to_string(),
        };
        Err(Error::NotReady(reason))
    }

    /// Token cancelled on shutdown; generation in flight stops early
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
