//! Object storage interface for remote forecast files (GCS/S3 compatible).

use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, gcp::GoogleCloudStorageBuilder, path::Path, ObjectStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use wind_common::{WindError, WindResult};

/// Which object storage service holds the forecast files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Google Cloud Storage, credentials from the environment or a
    /// service account file
    Gcs,
    /// Amazon S3 or an S3-compatible mirror
    S3,
}

/// Configuration for object storage connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectStorageConfig {
    pub backend: StorageBackend,
    /// Bucket name
    pub bucket: String,
    /// GCS service account JSON file (GCS only)
    pub service_account_path: Option<String>,
    /// Custom endpoint URL (S3 only)
    pub endpoint: Option<String>,
    /// AWS region (S3 only)
    pub region: String,
    /// Allow HTTP (for local S3 mirrors)
    pub allow_http: bool,
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Gcs,
            bucket: "ecmwf-open-data".to_string(),
            service_account_path: None,
            endpoint: None,
            region: "us-east-1".to_string(),
            allow_http: false,
        }
    }
}

/// Byte-range access to remote objects.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `range` from the object at `path`.
    async fn read_range(&self, path: &str, range: Range<u64>) -> WindResult<Bytes>;

    /// Human readable location of `path`, used in error context.
    fn describe(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Authenticated object storage client for forecast files.
pub struct ObjectStorage {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    scheme: &'static str,
}

impl ObjectStorage {
    /// Create a new object storage client from config.
    pub fn new(config: &ObjectStorageConfig) -> WindResult<Self> {
        let (store, scheme): (Arc<dyn ObjectStore>, _) = match config.backend {
            StorageBackend::Gcs => {
                let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(&config.bucket);
                if let Some(path) = &config.service_account_path {
                    builder = builder.with_service_account_path(path);
                }
                let store = builder.build().map_err(|e| {
                    WindError::StorageError(format!(
                        "Failed to create GCS client (check credentials): {}",
                        e
                    ))
                })?;
                (Arc::new(store), "gs")
            }
            StorageBackend::S3 => {
                let mut builder = AmazonS3Builder::from_env()
                    .with_bucket_name(&config.bucket)
                    .with_region(&config.region);
                if let Some(endpoint) = &config.endpoint {
                    builder = builder.with_endpoint(endpoint);
                }
                if config.allow_http {
                    builder = builder.with_allow_http(true);
                }
                let store = builder.build().map_err(|e| {
                    WindError::StorageError(format!("Failed to create S3 client: {}", e))
                })?;
                (Arc::new(store), "s3")
            }
        };

        Ok(Self {
            store,
            bucket: config.bucket.clone(),
            scheme,
        })
    }

    /// Wrap an existing store, e.g. an in-memory one.
    pub fn from_store(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            scheme: "store",
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Read a byte range from a path.
    #[instrument(skip(self), fields(bucket = %self.bucket, path = %path))]
    pub async fn get_range(&self, path: &str, start: usize, end: usize) -> WindResult<Bytes> {
        let location = Path::from(path);

        let result = self
            .store
            .get_range(&location, start..end)
            .await
            .map_err(|e| WindError::StorageError(format!("Failed to read range {}: {}", path, e)))?;

        debug!(size = result.len(), "Read range");
        Ok(result)
    }
}

#[async_trait]
impl RangeReader for ObjectStorage {
    async fn read_range(&self, path: &str, range: Range<u64>) -> WindResult<Bytes> {
        let start = usize::try_from(range.start)
            .map_err(|_| WindError::StorageError(format!("offset {} too large", range.start)))?;
        let end = usize::try_from(range.end)
            .map_err(|_| WindError::StorageError(format!("offset {} too large", range.end)))?;
        self.get_range(path, start, end).await
    }

    fn describe(&self, path: &str) -> String {
        format!("{}://{}/{}", self.scheme, self.bucket, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    #[tokio::test]
    async fn test_read_range_returns_exact_slice() {
        let store = Arc::new(InMemory::new());
        let data: Vec<u8> = (0u8..100).collect();
        store
            .put(&Path::from("run/file.grib2"), Bytes::from(data).into())
            .await
            .unwrap();

        let storage = ObjectStorage::from_store(store, "test-bucket");
        let bytes = storage.read_range("run/file.grib2", 10..14).await.unwrap();
        assert_eq!(bytes.as_ref(), &[10, 11, 12, 13]);
    }

    #[tokio::test]
    async fn test_read_range_missing_object() {
        let storage = ObjectStorage::from_store(Arc::new(InMemory::new()), "test-bucket");
        let err = storage.read_range("missing.grib2", 0..4).await.unwrap_err();
        assert!(matches!(err, WindError::StorageError(_)));
    }

    #[test]
    fn test_describe() {
        let storage = ObjectStorage::from_store(Arc::new(InMemory::new()), "ecmwf-open-data");
        assert_eq!(storage.describe("a/b.grib2"), "store://ecmwf-open-data/a/b.grib2");
    }
}
