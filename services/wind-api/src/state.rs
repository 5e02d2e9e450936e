//! Application state for the wind API.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use grid_processor::{QueryResolver, RunCacheStore, WorkingSetCache};
use ingestion::{RemoteRunSource, RunSource};
use storage::{ObjectStorage, RunArtifactStore};

use crate::config::WindApiConfig;

/// Shared application state.
pub struct AppState {
    /// Read-through cache of persisted run artifacts.
    pub runs: Arc<RunCacheStore>,

    /// Bounded in-memory runs for series queries.
    pub working_set: Arc<WorkingSetCache>,

    /// Point/range/series resolution.
    pub resolver: QueryResolver,

    /// Prometheus exporter, when a recorder is installed.
    pub prometheus: Option<PrometheusHandle>,

    pub config: WindApiConfig,
}

impl AppState {
    /// Wire the caches around an arbitrary run source.
    pub fn new(config: WindApiConfig, source: Arc<dyn RunSource>) -> Result<Self> {
        config.validate()?;

        let artifacts = RunArtifactStore::new(config.cache_dir.clone(), config.grid);
        let runs = Arc::new(RunCacheStore::new(artifacts, source));
        let working_set = Arc::new(WorkingSetCache::new(&config.working_set, runs.clone())?);
        let resolver = QueryResolver::new(
            runs.clone(),
            working_set.clone(),
            config.grid,
            config.limits,
        );

        Ok(Self {
            runs,
            working_set,
            resolver,
            prometheus: None,
            config,
        })
    }

    /// Connect to object storage and build the remote acquisition pipeline.
    pub fn from_config(config: WindApiConfig) -> Result<Self> {
        let storage = ObjectStorage::new(&config.storage)
            .context("Failed to initialize object storage")?;
        let source = RemoteRunSource::from_config(&config.acquisition, Arc::new(storage))
            .context("Failed to initialize run source")?;

        info!(
            cache_dir = %config.cache_dir.display(),
            bucket = %config.storage.bucket,
            index = %config.acquisition.index_base_url,
            working_set = config.working_set.capacity,
            "Initialized wind data pipeline"
        );

        Self::new(config, Arc::new(source))
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
