//! Cache administration.

use std::sync::Arc;

use axum::{extract::Extension, Json};
use serde::Serialize;
use tracing::info;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: usize,
    pub success: bool,
}

/// POST /admin/cache/clear - Drop every run held in memory.
///
/// Persisted artifacts are kept.
pub async fn clear_cache_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<ClearCacheResponse> {
    let cleared = state.working_set.clear().await;
    info!(cleared, "Working set cleared by request");
    Json(ClearCacheResponse {
        cleared,
        success: true,
    })
}
