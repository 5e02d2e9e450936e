//! Run caching layers.
//!
//! - [`RunCacheStore`]: read-through cache over persisted artifacts that
//!   drives acquisition on a miss.
//! - [`WorkingSetCache`]: bounded in-memory set of parsed runs in front of
//!   the store.

mod run_cache;
mod working_set;

use std::sync::Arc;

use async_trait::async_trait;

use wind_common::{RunKey, RunRecord, WindResult};

pub use run_cache::RunCacheStore;
pub use working_set::WorkingSetCache;

/// Anything that can hand out the record of a run.
#[async_trait]
pub trait RunLoader: Send + Sync {
    async fn load_run(&self, key: &RunKey) -> WindResult<Arc<RunRecord>>;
}
