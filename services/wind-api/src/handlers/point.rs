//! Single point query handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use wind_common::WindResult;

use super::params::{required_f64, run_key};
use super::status_for;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PointParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub date: Option<String>,
    pub batch: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PointResponse {
    pub u: f64,
    pub v: f64,
    pub status: u16,
    pub success: bool,
}

impl PointResponse {
    fn failure(status: StatusCode) -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            status: status.as_u16(),
            success: false,
        }
    }
}

/// GET /api?lat&lon&date&batch
pub async fn point_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<PointParams>,
) -> (StatusCode, Json<PointResponse>) {
    match point_query(&state, &params).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            let status = status_for(&e);
            warn!(error = %e, status = status.as_u16(), "Point query failed");
            (status, Json(PointResponse::failure(status)))
        }
    }
}

async fn point_query(state: &AppState, params: &PointParams) -> WindResult<PointResponse> {
    let lat = required_f64(&params.lat, "lat")?;
    let lon = required_f64(&params.lon, "lon")?;
    let key = run_key(&params.date, &params.batch)?;

    let result = state.resolver.point(lat, lon, &key).await?;
    Ok(PointResponse {
        u: result.u,
        v: result.v,
        status: StatusCode::OK.as_u16(),
        success: true,
    })
}
