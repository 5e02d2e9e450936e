//! Synthetic grids and run records with predictable values.
//!
//! Record values encode their own position so a test can tell which grid
//! index a query resolved to:
//!
//! - `10u[i] = seed * 1000 + i`
//! - `10v[i] = -(seed * 1000 + i)`

use std::collections::HashMap;

use wind_common::{GridGeometry, RunRecord, U_FIELD, V_FIELD};

/// 10 degree global grid: 36 x 19 = 684 points.
pub fn test_grid() -> GridGeometry {
    GridGeometry::global(10.0)
}

/// Expected `10u` value of a ramp record at `index`.
pub fn ramp_u(seed: u32, index: usize) -> f64 {
    f64::from(seed) * 1000.0 + index as f64
}

/// Expected `10v` value of a ramp record at `index`.
pub fn ramp_v(seed: u32, index: usize) -> f64 {
    -ramp_u(seed, index)
}

/// Decoded fields whose values encode their index and `seed`.
pub fn ramp_fields(grid: &GridGeometry, seed: u32) -> HashMap<String, Vec<f64>> {
    let u: Vec<f64> = (0..grid.len()).map(|i| ramp_u(seed, i)).collect();
    let v: Vec<f64> = (0..grid.len()).map(|i| ramp_v(seed, i)).collect();

    let mut fields = HashMap::new();
    fields.insert(U_FIELD.to_string(), u);
    fields.insert(V_FIELD.to_string(), v);
    fields
}

/// Run record built from [`ramp_fields`].
pub fn ramp_record(grid: &GridGeometry, seed: u32) -> RunRecord {
    let u = (0..grid.len()).map(|i| ramp_u(seed, i)).collect();
    let v = (0..grid.len()).map(|i| ramp_v(seed, i)).collect();
    RunRecord::new(u, v, grid).expect("ramp record matches its grid")
}

/// Run record with the same value at every point.
pub fn constant_record(grid: &GridGeometry, u: f64, v: f64) -> RunRecord {
    RunRecord::new(vec![u; grid.len()], vec![v; grid.len()], grid)
        .expect("constant record matches its grid")
}
