//! Service configuration.
//!
//! Built from defaults, then either a YAML file or environment variables.
//! Every section is optional in YAML; missing keys keep their defaults.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use grid_processor::{EvictionPolicy, QueryLimits, WorkingSetConfig};
use ingestion::{AcquisitionConfig, DecoderConfig};
use storage::{ObjectStorageConfig, StorageBackend};
use wind_common::GridGeometry;

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindApiConfig {
    /// Directory holding per-run artifacts
    pub cache_dir: PathBuf,

    /// Grid the decoded fields are laid out on
    pub grid: GridGeometry,

    /// Authenticated object storage for chunk reads
    pub storage: ObjectStorageConfig,

    /// Index resolution and decoding
    pub acquisition: AcquisitionConfig,

    /// In-memory run cache used by series queries
    pub working_set: WorkingSetConfig,

    /// Query fan-out limits
    pub limits: QueryLimits,
}

impl Default for WindApiConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tmp"),
            grid: GridGeometry::IFS_0P25,
            storage: ObjectStorageConfig::default(),
            acquisition: AcquisitionConfig::default(),
            working_set: WorkingSetConfig::default(),
            limits: QueryLimits::default(),
        }
    }
}

impl WindApiConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml_str(&content).with_context(|| format!("Failed to parse: {:?}", path))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = env::var("WIND_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }

        if let Ok(bucket) = env::var("WIND_BUCKET") {
            config.storage.bucket = bucket.clone();
            config.acquisition.bucket = bucket;
        }
        if let Ok(backend) = env::var("WIND_STORAGE_BACKEND") {
            config.storage.backend = match backend.to_lowercase().as_str() {
                "gcs" | "gs" => StorageBackend::Gcs,
                "s3" => StorageBackend::S3,
                other => anyhow::bail!("Unknown storage backend: {}", other),
            };
        }
        if let Ok(path) = env::var("GOOGLE_SERVICE_ACCOUNT") {
            config.storage.service_account_path = Some(path);
        }
        if let Ok(endpoint) = env::var("S3_ENDPOINT") {
            config.storage.endpoint = Some(endpoint);
        }
        if let Ok(region) = env::var("S3_REGION") {
            config.storage.region = region;
        }
        config.storage.allow_http = env::var("S3_ALLOW_HTTP")
            .map(|v| v == "true")
            .unwrap_or(config.storage.allow_http);

        if let Ok(host) = env::var("WIND_INDEX_BASE_URL") {
            config.acquisition.index_base_url = host;
        }
        if let Some(secs) = parse_env("WIND_INDEX_TIMEOUT_SECS")? {
            config.acquisition.index_timeout_secs = secs;
        }
        if let Ok(dir) = env::var("WIND_DECODER_TEMP_DIR") {
            config.acquisition.temp_dir = Some(PathBuf::from(dir));
        }
        match env::var("WIND_DECODER").ok().as_deref() {
            None | Some("grib_dump") => {
                if let Ok(program) = env::var("WIND_GRIB_DUMP_PROGRAM") {
                    config.acquisition.decoder = DecoderConfig::GribDump {
                        program,
                        args: vec!["-j".to_string()],
                    };
                }
            }
            Some("embedded") => config.acquisition.decoder = DecoderConfig::Embedded,
            Some(other) => anyhow::bail!("Unknown decoder: {}", other),
        }

        if let Some(capacity) = parse_env("WIND_WORKING_SET_CAPACITY")? {
            config.working_set.capacity = capacity;
        }
        if let Some(policy) = parse_env::<EvictionPolicy>("WIND_WORKING_SET_POLICY")? {
            config.working_set.policy = policy;
        }
        if let Some(max) = parse_env("WIND_MAX_RANGE_SAMPLES")? {
            config.limits.max_range_samples = max;
        }
        if let Some(max) = parse_env("WIND_MAX_SERIES_DAYS")? {
            config.limits.max_series_days = max;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.working_set.validate()?;
        self.limits.validate()?;
        if self.storage.bucket != self.acquisition.bucket {
            tracing::warn!(
                storage = %self.storage.bucket,
                index = %self.acquisition.bucket,
                "Object storage and index buckets differ"
            );
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {}={}: {}", name, value, e)),
        Err(_) => Ok(None),
    }
}
