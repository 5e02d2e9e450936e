//! Run caching and query resolution.
//!
//! # Architecture
//!
//! ```text
//! point / range query            series query
//!      │                              │
//!      │                              ▼
//!      │                     WorkingSetCache (bounded, in memory)
//!      │                              │ miss
//!      ▼                              ▼
//! RunCacheStore::get_run(key) ◄───────┘
//!      │
//!      ├─► artifact on disk parses: return it
//!      │
//!      └─► miss: per-run token ─► RunSource::fetch_run
//!                                     │
//!                                     ▼
//!                         RunArtifactStore::materialize ─► re-read
//! ```
//!
//! # Example
//!
//! ```ignore
//! let runs = Arc::new(RunCacheStore::new(artifacts, source));
//! let working_set = Arc::new(WorkingSetCache::new(&WorkingSetConfig::default(), runs.clone())?);
//! let resolver = QueryResolver::new(runs, working_set, grid, QueryLimits::default());
//!
//! let wind = resolver.point(52.5, 13.4, &RunKey::parse("20240101", "00z")?).await?;
//! ```

pub mod cache;
pub mod config;
pub mod query;
pub mod types;

// Re-export commonly used types at crate root
pub use cache::{RunCacheStore, RunLoader, WorkingSetCache};
pub use config::{EvictionPolicy, QueryLimits, WorkingSetConfig};
pub use query::{date_range, normalize_lon, range_samples, QueryResolver};
pub use types::{CacheStats, PointResult, RangeRequest, RangeResult, SeriesRequest, SeriesResult};
