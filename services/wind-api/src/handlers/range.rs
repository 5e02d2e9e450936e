//! Rectangular range query handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use grid_processor::RangeRequest;
use wind_common::WindResult;

use super::params::{required_f64, run_key};
use super::status_for;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub slat: Option<String>,
    pub slon: Option<String>,
    pub elat: Option<String>,
    pub elon: Option<String>,
    pub step: Option<String>,
    pub date: Option<String>,
    pub batch: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RangeResponse {
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub status: u16,
    pub success: bool,
}

impl RangeResponse {
    fn failure(status: StatusCode) -> Self {
        Self {
            u: Vec::new(),
            v: Vec::new(),
            lats: Vec::new(),
            lons: Vec::new(),
            status: status.as_u16(),
            success: false,
        }
    }
}

/// GET /range?slat&slon&elat&elon&step&date&batch
pub async fn range_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> (StatusCode, Json<RangeResponse>) {
    match range_query(&state, &params).await {
        Ok(response) => (StatusCode::OK, Json(response)),
        Err(e) => {
            let status = status_for(&e);
            warn!(error = %e, status = status.as_u16(), "Range query failed");
            (status, Json(RangeResponse::failure(status)))
        }
    }
}

async fn range_query(state: &AppState, params: &RangeParams) -> WindResult<RangeResponse> {
    let request = RangeRequest {
        slat: required_f64(&params.slat, "slat")?,
        slon: required_f64(&params.slon, "slon")?,
        elat: required_f64(&params.elat, "elat")?,
        elon: required_f64(&params.elon, "elon")?,
        step: required_f64(&params.step, "step")?,
        key: run_key(&params.date, &params.batch)?,
    };

    let result = state.resolver.range(&request).await?;
    Ok(RangeResponse {
        u: result.u,
        v: result.v,
        lats: result.lats,
        lons: result.lons,
        status: StatusCode::OK.as_u16(),
        success: true,
    })
}
