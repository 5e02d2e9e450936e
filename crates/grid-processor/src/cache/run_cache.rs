//! Read-through run cache over persisted artifacts.
//!
//! `get_run` serves the artifact from disk when it parses. Otherwise it runs
//! the acquisition pipeline once and reads the fresh artifact back.
//! Concurrent misses for the same run wait on a per-run token and re-check
//! the artifact once they hold it, so they share one acquisition.
//!
//! Acquisitions run on their own task. A caller that goes away stops
//! waiting but the acquisition it started still completes and persists.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics::counter;
use tracing::{debug, info, instrument, warn, Instrument, Span};

use ingestion::RunSource;
use storage::RunArtifactStore;
use wind_common::{GridGeometry, RunKey, RunRecord, WindError, WindResult};

use super::RunLoader;

type Token = Arc<tokio::sync::Mutex<()>>;
type InFlight = Arc<Mutex<HashMap<RunKey, Token>>>;

pub struct RunCacheStore {
    artifacts: RunArtifactStore,
    source: Arc<dyn RunSource>,
    in_flight: InFlight,
}

impl RunCacheStore {
    pub fn new(artifacts: RunArtifactStore, source: Arc<dyn RunSource>) -> Self {
        Self {
            artifacts,
            source,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn artifacts(&self) -> &RunArtifactStore {
        &self.artifacts
    }

    pub fn grid(&self) -> &GridGeometry {
        self.artifacts.grid()
    }

    /// Return the record for `key`, acquiring and persisting it first if no
    /// valid artifact exists.
    ///
    /// Pipeline failures are reported as [`WindError::DownloadFailed`]; a
    /// failure to read the artifact the pipeline just wrote is reported as
    /// [`WindError::ReadAfterDownload`].
    #[instrument(skip(self), fields(run = %key))]
    pub async fn get_run(&self, key: &RunKey) -> WindResult<Arc<RunRecord>> {
        match self.artifacts.read(key).await {
            Ok(record) => {
                counter!("wind_run_cache_hits_total").increment(1);
                return Ok(Arc::new(record));
            }
            Err(e) => {
                counter!("wind_run_cache_misses_total").increment(1);
                debug!(reason = %e, "Run artifact unavailable");
            }
        }

        let guard = InFlightGuard::acquire(self.in_flight.clone(), *key)?;
        let artifacts = self.artifacts.clone();
        let source = self.source.clone();
        let key = *key;

        let task = tokio::spawn(
            async move {
                let _held = guard.token.lock().await;
                acquire_locked(&artifacts, source.as_ref(), &key).await
            }
            .instrument(Span::current()),
        );

        task.await
            .map_err(|e| WindError::InternalError(format!("run acquisition task failed: {}", e)))?
    }

    /// Number of runs with an acquisition in progress or queued.
    pub fn in_flight(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }
}

async fn acquire_locked(
    artifacts: &RunArtifactStore,
    source: &dyn RunSource,
    key: &RunKey,
) -> WindResult<Arc<RunRecord>> {
    // Another caller may have finished while we waited for the token.
    if let Ok(record) = artifacts.read(key).await {
        debug!("Run materialized by a concurrent request");
        return Ok(Arc::new(record));
    }

    counter!("wind_run_acquisitions_total").increment(1);
    info!("Acquiring run");

    if let Err(e) = download(artifacts, source, key).await {
        counter!("wind_run_acquisition_failures_total").increment(1);
        warn!(error = %e, "Run acquisition failed");
        return Err(WindError::DownloadFailed {
            key: *key,
            source: Box::new(e),
        });
    }

    match artifacts.read(key).await {
        Ok(record) => Ok(Arc::new(record)),
        Err(e) => {
            warn!(error = %e, "Read failed after download");
            Err(WindError::ReadAfterDownload {
                key: *key,
                source: Box::new(e),
            })
        }
    }
}

async fn download(
    artifacts: &RunArtifactStore,
    source: &dyn RunSource,
    key: &RunKey,
) -> WindResult<()> {
    let fields = source.fetch_run(key).await?;
    artifacts.materialize(key, fields).await?;
    Ok(())
}

/// Holds a reference to the per-run token and drops the map entry once no
/// other caller holds it.
struct InFlightGuard {
    in_flight: InFlight,
    key: RunKey,
    token: Token,
}

impl InFlightGuard {
    fn acquire(in_flight: InFlight, key: RunKey) -> WindResult<Self> {
        let token = {
            let mut map = in_flight
                .lock()
                .map_err(|e| WindError::InternalError(format!("in-flight map poisoned: {}", e)))?;
            map.entry(key).or_default().clone()
        };
        Ok(Self {
            in_flight,
            key,
            token,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.in_flight.lock() {
            let ours = map
                .get(&self.key)
                .is_some_and(|current| Arc::ptr_eq(current, &self.token));
            // One reference in the map, one in this guard.
            if ours && Arc::strong_count(&self.token) <= 2 {
                map.remove(&self.key);
            }
        }
    }
}

#[async_trait]
impl RunLoader for RunCacheStore {
    async fn load_run(&self, key: &RunKey) -> WindResult<Arc<RunRecord>> {
        self.get_run(key).await
    }
}
