//! HTTP request handlers for the emulated ollama API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::router::ModelRouter;
use crate::session::SessionToggles;
use crate::upstream::UpstreamClient;
use std::sync::Arc;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;
pub mod tags;

/// Application state shared across all handlers
///
/// Everything in here is read-only after startup; clones share the same
/// config, connection pool and metrics registry.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    router: ModelRouter,
    upstream: UpstreamClient,
    toggles: SessionToggles,
    metrics: Metrics,
}

impl AppState {
    /// Build the state from configuration and the resolved session toggles
    ///
    /// # Errors
    /// Returns an error if the HTTP client or the metrics registry cannot be
    /// created.
    pub fn new(config: Arc<Config>, toggles: SessionToggles) -> AppResult<Self> {
        let router = ModelRouter::new(config.upstream.base_url(), config.limits);
        let upstream = UpstreamClient::new(&config.upstream)?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("failed to register metrics: {}", e)))?;

        Ok(Self {
            config,
            router,
            upstream,
            toggles,
            metrics,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    pub fn toggles(&self) -> SessionToggles {
        self.toggles
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}
