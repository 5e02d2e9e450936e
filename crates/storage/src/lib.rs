//! Storage abstractions for the wind query service.
//!
//! Provides unified interfaces for:
//! - Remote object storage (GCS/S3) byte-range reads of forecast files
//! - Persisted per-run artifacts on local disk

pub mod object_store;
pub mod run_store;

pub use self::object_store::{ObjectStorage, ObjectStorageConfig, RangeReader, StorageBackend};
pub use run_store::RunArtifactStore;
