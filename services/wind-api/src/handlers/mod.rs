//! HTTP request handlers for the wind API.
//!
//! Query endpoints always answer JSON with `status` and `success` fields.
//! On failure the body carries zeroed values and the error's status code.

pub mod admin;
pub mod health;
pub mod params;
pub mod point;
pub mod range;
pub mod series;

pub use admin::clear_cache_handler;
pub use health::{health_handler, metrics_handler};
pub use point::point_handler;
pub use range::range_handler;
pub use series::series_handler;

use axum::http::StatusCode;
use wind_common::WindError;

/// Status code for a failed query.
pub(crate) fn status_for(error: &WindError) -> StatusCode {
    StatusCode::from_u16(error.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
