//! Wind API Service Library
//!
//! HTTP surface over the wind query core: single point, rectangular range
//! and date series lookups of ECMWF 10 m wind.

pub mod config;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the service router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Queries
        .route("/api", get(handlers::point_handler))
        .route("/range", get(handlers::range_handler))
        .route("/daterange", get(handlers::series_handler))
        // Health and metrics
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        // Administration
        .route("/admin/cache/clear", post(handlers::clear_cache_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
