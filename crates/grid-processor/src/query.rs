//! Point, rectangular range and date series queries.
//!
//! Resolvers never interpolate. Every coordinate is snapped to the nearest
//! grid point through [`GridGeometry::index_for`] and the stored values at
//! that index are returned as is.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, instrument, warn};

use wind_common::{GridGeometry, RunKey, WindError, WindResult, DATE_FORMAT};

use crate::cache::RunLoader;
use crate::config::QueryLimits;
use crate::types::{PointResult, RangeRequest, RangeResult, SeriesRequest, SeriesResult};

/// Resolves queries against cached runs.
///
/// Single-run queries read through `runs`; series queries read through
/// `series_runs`, normally the working set in front of the same store.
pub struct QueryResolver {
    runs: Arc<dyn RunLoader>,
    series_runs: Arc<dyn RunLoader>,
    grid: GridGeometry,
    limits: QueryLimits,
}

impl QueryResolver {
    pub fn new(
        runs: Arc<dyn RunLoader>,
        series_runs: Arc<dyn RunLoader>,
        grid: GridGeometry,
        limits: QueryLimits,
    ) -> Self {
        Self {
            runs,
            series_runs,
            grid,
            limits,
        }
    }

    pub fn grid(&self) -> &GridGeometry {
        &self.grid
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Wind at the grid point nearest to `(lat, lon)`.
    #[instrument(skip(self), fields(run = %key))]
    pub async fn point(&self, lat: f64, lon: f64, key: &RunKey) -> WindResult<PointResult> {
        let index = self.grid.index_for(lat, lon)?;
        let record = self.runs.load_run(key).await?;
        let (u, v) = record.values_at(index)?;
        Ok(PointResult { u, v })
    }

    /// Sample a lat/lon rectangle every `step` degrees.
    #[instrument(skip(self, request), fields(run = %request.key))]
    pub async fn range(&self, request: &RangeRequest) -> WindResult<RangeResult> {
        let samples = range_samples(request, self.limits.max_range_samples)?;
        let record = self.runs.load_run(&request.key).await?;

        let mut result = RangeResult::with_capacity(samples.len());
        for (lat, lon) in samples {
            let index = match self.grid.index_for(lat, lon) {
                Ok(index) => index,
                Err(e) => {
                    debug!(lat, lon, error = %e, "Skipping sample");
                    continue;
                }
            };
            match record.values_at(index) {
                Ok((u, v)) => result.push(lat, lon, u, v),
                Err(e) => debug!(lat, lon, error = %e, "Skipping sample"),
            }
        }

        if result.is_empty() {
            return Err(WindError::NoData(format!(
                "no valid samples in range ({}, {}) to ({}, {})",
                request.slat, request.slon, request.elat, request.elon
            )));
        }
        Ok(result)
    }

    /// Wind at one coordinate for every day in `[start, end]`.
    ///
    /// A day that cannot be loaded yields `(0, 0)` instead of failing the
    /// whole series.
    #[instrument(skip(self, request), fields(batch = %request.batch))]
    pub async fn series(&self, request: &SeriesRequest) -> WindResult<SeriesResult> {
        let index = self.grid.index_for(request.lat, request.lon)?;
        let dates = date_range(request.start, request.end, self.limits.max_series_days)?;

        let mut result = SeriesResult {
            dates: Vec::with_capacity(dates.len()),
            u: Vec::with_capacity(dates.len()),
            v: Vec::with_capacity(dates.len()),
            failed_dates: Vec::new(),
        };

        for date in dates {
            let label = date.format(DATE_FORMAT).to_string();
            let key = RunKey::new(date, request.batch);

            let values = match self.series_runs.load_run(&key).await {
                Ok(record) => record.values_at(index),
                Err(e) => Err(e),
            };

            let (u, v) = match values {
                Ok(values) => values,
                Err(e) => {
                    warn!(run = %key, error = %e, "Series date unavailable, using zero");
                    result.failed_dates.push(label.clone());
                    (0.0, 0.0)
                }
            };

            result.dates.push(label);
            result.u.push(u);
            result.v.push(v);
        }

        if result.dates.is_empty() {
            return Err(WindError::NoData(format!(
                "no dates between {} and {}",
                request.start, request.end
            )));
        }
        Ok(result)
    }
}

/// Number of samples along one axis: `floor(|end - start| / step) + 1`.
fn axis_steps(start: f64, end: f64, step: f64) -> f64 {
    ((end - start).abs() / step).floor() + 1.0
}

fn direction(start: f64, end: f64) -> f64 {
    if end - start >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Bring a longitude into [-180, 180] by whole turns.
pub fn normalize_lon(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0 * ((lon - 180.0) / 360.0).ceil()
    } else if lon < -180.0 {
        lon + 360.0 * ((-180.0 - lon) / 360.0).ceil()
    } else {
        lon
    }
}

/// Sample coordinates of a range request in generation order
/// (latitude-major), latitudes clamped to the poles and longitudes
/// normalized.
pub fn range_samples(request: &RangeRequest, max_samples: usize) -> WindResult<Vec<(f64, f64)>> {
    for (name, value) in [
        ("slat", request.slat),
        ("slon", request.slon),
        ("elat", request.elat),
        ("elon", request.elon),
    ] {
        if !value.is_finite() {
            return Err(WindError::invalid_parameter(name, format!("{} is not finite", value)));
        }
    }
    if !request.step.is_finite() || request.step <= 0.0 {
        return Err(WindError::invalid_parameter(
            "step",
            format!("must be a positive number, got {}", request.step),
        ));
    }

    let lat_steps = axis_steps(request.slat, request.elat, request.step);
    let lon_steps = axis_steps(request.slon, request.elon, request.step);
    let total = lat_steps * lon_steps;
    if total > max_samples as f64 {
        return Err(WindError::invalid_parameter(
            "step",
            format!(
                "range would produce {} samples, limit is {}",
                total, max_samples
            ),
        ));
    }

    let lat_dir = direction(request.slat, request.elat);
    let lon_dir = direction(request.slon, request.elon);
    let (lat_steps, lon_steps) = (lat_steps as usize, lon_steps as usize);

    let mut samples = Vec::with_capacity(lat_steps * lon_steps);
    for i in 0..lat_steps {
        let lat = (request.slat + i as f64 * request.step * lat_dir).clamp(-90.0, 90.0);
        for j in 0..lon_steps {
            let lon = normalize_lon(request.slon + j as f64 * request.step * lon_dir);
            samples.push((lat, lon));
        }
    }
    Ok(samples)
}

/// Every calendar day between two dates inclusive, ascending, whichever
/// order they are given in.
pub fn date_range(a: NaiveDate, b: NaiveDate, max_days: usize) -> WindResult<Vec<NaiveDate>> {
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    let days = (end - start).num_days() as usize + 1;
    if days > max_days {
        return Err(WindError::invalid_parameter(
            "end_date",
            format!("range covers {} days, limit is {}", days, max_days),
        ));
    }

    Ok((0..days)
        .map(|offset| start + Duration::days(offset as i64))
        .collect())
}
