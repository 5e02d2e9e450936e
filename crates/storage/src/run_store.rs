//! Persisted run artifacts on local disk.
//!
//! Each run is stored as one JSON document `<dir>/<yyyymmdd>-<batch>.json`
//! holding the `10u` and `10v` arrays. The file name depends only on the run
//! key, so a later materialization of the same run replaces the earlier one.
//!
//! Writes go to a temp file in the same directory which is synced and then
//! renamed over the target, so readers see either the previous artifact or
//! the complete new one, never a truncated file.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use wind_common::{GridGeometry, RunKey, RunRecord, WindError, WindResult};

/// Reads and writes per-run artifacts under a cache directory.
#[derive(Debug, Clone)]
pub struct RunArtifactStore {
    dir: PathBuf,
    grid: GridGeometry,
}

impl RunArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, grid: GridGeometry) -> Self {
        Self {
            dir: dir.into(),
            grid,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    /// Location of the artifact for `key`.
    pub fn path_for(&self, key: &RunKey) -> PathBuf {
        self.dir.join(key.artifact_name())
    }

    /// Read and validate the artifact for `key`.
    #[instrument(skip(self), fields(run = %key))]
    pub async fn read(&self, key: &RunKey) -> WindResult<RunRecord> {
        let path = self.path_for(key);
        let display = path.display().to_string();

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WindError::ArtifactMissing { path: display });
            }
            Err(e) => return Err(WindError::corrupt_artifact(display, e.to_string())),
        };

        let grid = self.grid;
        let record = tokio::task::spawn_blocking(move || -> WindResult<RunRecord> {
            let record: RunRecord = serde_json::from_slice(&content)
                .map_err(|e| WindError::corrupt_artifact(display.clone(), e.to_string()))?;
            record
                .validate(&grid)
                .map_err(|e| WindError::corrupt_artifact(display, e.to_string()))?;
            Ok(record)
        })
        .await
        .map_err(|e| WindError::InternalError(format!("artifact parse task failed: {}", e)))??;

        debug!(points = record.len(), "Read run artifact");
        Ok(record)
    }

    /// Build a record from decoded fields and persist it.
    ///
    /// Nothing is written unless both fields are present and cover the grid.
    pub async fn materialize(
        &self,
        key: &RunKey,
        fields: HashMap<String, Vec<f64>>,
    ) -> WindResult<RunRecord> {
        let record = RunRecord::from_fields(fields, &self.grid)?;
        self.write(key, &record).await?;
        Ok(record)
    }

    /// Atomically write `record` as the artifact for `key`.
    #[instrument(skip(self, record), fields(run = %key))]
    pub async fn write(&self, key: &RunKey, record: &RunRecord) -> WindResult<PathBuf> {
        record.validate(&self.grid)?;

        let dir = self.dir.clone();
        let target = self.path_for(key);
        let prefix = format!(".{}.", key);
        let record = record.clone();

        let path = tokio::task::spawn_blocking(move || -> WindResult<PathBuf> {
            std::fs::create_dir_all(&dir)?;

            let mut temp = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(".tmp")
                .tempfile_in(&dir)?;
            {
                let mut writer = std::io::BufWriter::new(temp.as_file_mut());
                serde_json::to_writer(&mut writer, &record)?;
                writer.flush()?;
            }
            temp.as_file().sync_all()?;
            temp.persist(&target).map_err(|e| {
                WindError::StorageError(format!(
                    "Failed to move artifact into {}: {}",
                    target.display(),
                    e.error
                ))
            })?;
            Ok(target)
        })
        .await
        .map_err(|e| WindError::InternalError(format!("artifact write task failed: {}", e)))??;

        info!(path = %path.display(), "Materialized run artifact");
        Ok(path)
    }

    /// Delete the artifact for `key` if present.
    pub async fn remove(&self, key: &RunKey) -> WindResult<bool> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
