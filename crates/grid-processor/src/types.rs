//! Query requests, results and cache statistics.

use chrono::NaiveDate;
use serde::Serialize;

use wind_common::{Batch, RunKey};

/// Wind at a single coordinate of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointResult {
    pub u: f64,
    pub v: f64,
}

/// Rectangular sampling request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeRequest {
    pub slat: f64,
    pub slon: f64,
    pub elat: f64,
    pub elon: f64,
    /// Sample spacing in degrees, along both axes.
    pub step: f64,
    pub key: RunKey,
}

/// Samples of a range query, parallel lists in generation order
/// (latitude-major).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RangeResult {
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
}

impl RangeResult {
    pub fn len(&self) -> usize {
        self.u.len()
    }

    pub fn is_empty(&self) -> bool {
        self.u.is_empty()
    }

    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            lats: Vec::with_capacity(n),
            lons: Vec::with_capacity(n),
            u: Vec::with_capacity(n),
            v: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, lat: f64, lon: f64, u: f64, v: f64) {
        self.lats.push(lat);
        self.lons.push(lon);
        self.u.push(u);
        self.v.push(v);
    }
}

/// Same coordinate across consecutive days of one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRequest {
    pub lat: f64,
    pub lon: f64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub batch: Batch,
}

/// One entry per calendar day, ascending. Days that failed to load hold
/// `(0, 0)` and are listed in `failed_dates`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeriesResult {
    pub dates: Vec<String>,
    pub u: Vec<f64>,
    pub v: Vec<f64>,
    #[serde(skip)]
    pub failed_dates: Vec<String>,
}

/// Statistics for the working-set cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
