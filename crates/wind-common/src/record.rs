//! Decoded per-run wind fields.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};
use crate::grid::GridGeometry;

/// GRIB short name of the 10 m eastward wind component.
pub const U_FIELD: &str = "10u";
/// GRIB short name of the 10 m northward wind component.
pub const V_FIELD: &str = "10v";
/// Fields every run must provide.
pub const WIND_FIELDS: [&str; 2] = [U_FIELD, V_FIELD];

/// Both wind components of one run as flat arrays in grid scan order.
///
/// The serialized form is the persisted artifact:
/// `{"10u": [...], "10v": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "10u")]
    u: Vec<f64>,
    #[serde(rename = "10v")]
    v: Vec<f64>,
}

impl RunRecord {
    /// Build a record, checking both fields cover the whole grid.
    pub fn new(u: Vec<f64>, v: Vec<f64>, grid: &GridGeometry) -> WindResult<Self> {
        let record = Self { u, v };
        record.validate(grid)?;
        Ok(record)
    }

    /// Build a record from decoded fields keyed by GRIB short name.
    pub fn from_fields(
        mut fields: HashMap<String, Vec<f64>>,
        grid: &GridGeometry,
    ) -> WindResult<Self> {
        let u = fields
            .remove(U_FIELD)
            .ok_or_else(|| WindError::InvalidRecord(format!("missing field {}", U_FIELD)))?;
        let v = fields
            .remove(V_FIELD)
            .ok_or_else(|| WindError::InvalidRecord(format!("missing field {}", V_FIELD)))?;
        Self::new(u, v, grid)
    }

    /// Check the record against the grid it claims to cover.
    pub fn validate(&self, grid: &GridGeometry) -> WindResult<()> {
        for (name, values) in [(U_FIELD, &self.u), (V_FIELD, &self.v)] {
            if values.len() != grid.len() {
                return Err(WindError::InvalidRecord(format!(
                    "{} has {} values, grid has {} points",
                    name,
                    values.len(),
                    grid.len()
                )));
            }
        }
        Ok(())
    }

    pub fn u(&self) -> &[f64] {
        &self.u
    }

    pub fn v(&self) -> &[f64] {
        &self.v
    }

    /// Number of grid points in the record.
    pub fn len(&self) -> usize {
        self.u.len().min(self.v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The (u, v) pair at a flat grid index.
    pub fn values_at(&self, index: usize) -> WindResult<(f64, f64)> {
        match (self.u.get(index), self.v.get(index)) {
            (Some(u), Some(v)) => Ok((*u, *v)),
            _ => Err(WindError::OutOfBounds {
                index,
                len: self.len(),
            }),
        }
    }
}
