//! Date range (series) query handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use grid_processor::SeriesRequest;
use wind_common::WindResult;

use super::params::{required_batch, required_date, required_f64};
use super::status_for;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SeriesParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub batch: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SeriesResponse {
    pub dates: Vec<String>,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub status: u16,
    pub success: bool,
}

impl SeriesResponse {
    fn failure(status: StatusCode) -> Self {
        Self {
            dates: Vec::new(),
            u: Vec::new(),
            v: Vec::new(),
            status: status.as_u16(),
            success: false,
        }
    }
}

/// GET /daterange?lat&lon&start_date&end_date&batch
pub async fn series_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<SeriesParams>,
) -> (StatusCode, Json<SeriesResponse>) {
    match series_query(&state, &params).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            let status = status_for(&e);
            warn!(error = %e, status = status.as_u16(), "Series query failed");
            (status, Json(SeriesResponse::failure(status)))
        }
    }
}

async fn series_query(state: &AppState, params: &SeriesParams) -> WindResult<SeriesResponse> {
    let request = SeriesRequest {
        lat: required_f64(&params.lat, "lat")?,
        lon: required_f64(&params.lon, "lon")?,
        start: required_date(&params.start_date, "start_date")?,
        end: required_date(&params.end_date, "end_date")?,
        batch: required_batch(&params.batch)?,
    };

    let result = state.resolver.series(&request).await?;
    if !result.failed_dates.is_empty() {
        info!(
            failed = ?result.failed_dates,
            total = result.dates.len(),
            "Series answered with zero-filled dates"
        );
    }

    Ok(SeriesResponse {
        dates: result.dates,
        u: result.u,
        v: result.v,
        status: StatusCode::OK.as_u16(),
        success: true,
    })
}
