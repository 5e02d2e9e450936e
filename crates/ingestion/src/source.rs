//! Run sources: where the run cache gets fields for a missing run.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use storage::RangeReader;
use wind_common::{RunKey, WindResult};

use crate::acquire::ChunkAcquirer;
use crate::config::AcquisitionConfig;
use crate::index::IndexResolver;

/// Decoded fields of one run, keyed by field name (`10u`, `10v`).
pub type RunFields = HashMap<String, Vec<f64>>;

/// Produces the decoded fields for a run.
#[async_trait]
pub trait RunSource: Send + Sync {
    async fn fetch_run(&self, key: &RunKey) -> WindResult<RunFields>;
}

/// Resolves the run index over HTTPS, then fetches and decodes each chunk.
pub struct RemoteRunSource {
    resolver: IndexResolver,
    acquirer: ChunkAcquirer,
}

impl RemoteRunSource {
    pub fn new(resolver: IndexResolver, acquirer: ChunkAcquirer) -> Self {
        Self { resolver, acquirer }
    }

    /// Build the resolver and decoder from `config`, reading chunks through
    /// `reader`.
    pub fn from_config(
        config: &AcquisitionConfig,
        reader: Arc<dyn RangeReader>,
    ) -> WindResult<Self> {
        let resolver = IndexResolver::new(config)?;
        let decoder = config.decoder.build(config.temp_dir.clone());
        Ok(Self::new(resolver, ChunkAcquirer::new(reader, decoder)))
    }
}

#[async_trait]
impl RunSource for RemoteRunSource {
    #[instrument(skip(self), fields(run = %key))]
    async fn fetch_run(&self, key: &RunKey) -> WindResult<RunFields> {
        let chunks = self.resolver.resolve(key).await?;
        info!(
            chunks = chunks.len(),
            decoder = self.acquirer.decoder_name(),
            "Resolved run index"
        );
        self.acquirer.acquire_all(key, &chunks).await
    }
}
