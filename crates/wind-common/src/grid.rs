//! Grid geometry and coordinate-to-index mapping.
//!
//! Run records are flat arrays in the GRIB scan order of the IFS 0.25°
//! global grid: rows run from the north pole southward, and each row starts
//! at 180° longitude and wraps eastward through 0° back to 179.75°.

use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};

/// Specification of a regular global lat/lon grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Number of points along a row (longitude direction)
    pub nx: usize,
    /// Number of rows (latitude direction)
    pub ny: usize,
    /// Latitude of the first row (degrees north)
    pub lat_first: f64,
    /// Distance between rows in degrees, positive going south
    pub lat_step: f64,
    /// Longitude of the first column (degrees east)
    pub lon_first: f64,
    /// Distance between columns in degrees
    pub lon_step: f64,
    /// Declared number of points in a decoded field
    pub total_points: usize,
}

/// A grid point with both its flat index and coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub index: usize,
    pub lat: f64,
    pub lon: f64,
}

impl GridGeometry {
    /// ECMWF IFS open data 0.25° global grid.
    pub const IFS_0P25: GridGeometry = GridGeometry {
        nx: 1440,
        ny: 721,
        lat_first: 90.0,
        lat_step: 0.25,
        lon_first: 180.0,
        lon_step: 0.25,
        total_points: 1_038_240,
    };

    /// A global grid with the IFS layout at an arbitrary resolution.
    ///
    /// `step` must divide 180 evenly.
    pub fn global(step: f64) -> Self {
        let nx = (360.0 / step).round() as usize;
        let ny = (180.0 / step).round() as usize + 1;
        Self {
            nx,
            ny,
            lat_first: 90.0,
            lat_step: step,
            lon_first: 180.0,
            lon_step: step,
            total_points: nx * ny,
        }
    }

    /// Check the declared point count against the grid dimensions.
    pub fn validate(&self) -> WindResult<()> {
        if self.nx == 0 || self.ny == 0 {
            return Err(WindError::ConfigError("grid has no points".to_string()));
        }
        if self.lat_step <= 0.0 || self.lon_step <= 0.0 {
            return Err(WindError::ConfigError(format!(
                "grid steps must be positive (lat {}, lon {})",
                self.lat_step, self.lon_step
            )));
        }
        if self.nx * self.ny != self.total_points {
            return Err(WindError::ConfigError(format!(
                "grid total {} does not match {} x {}",
                self.total_points, self.nx, self.ny
            )));
        }
        Ok(())
    }

    /// Total number of grid points.
    pub fn len(&self) -> usize {
        self.total_points
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.total_points == 0
    }

    /// Column of the nearest grid point for any longitude.
    pub fn column_for(&self, lon: f64) -> usize {
        let normalized = lon.rem_euclid(360.0);
        let mut offset = normalized - self.lon_first;
        if offset < 0.0 {
            offset += 360.0;
        }
        // Exactly 360° past the origin lands back on column 0.
        (offset / self.lon_step).round() as usize % self.nx
    }

    /// Row of the nearest grid point. Latitudes beyond the poles clamp to
    /// the first or last row.
    pub fn row_for(&self, lat: f64) -> usize {
        let row = ((self.lat_first - lat) / self.lat_step).round();
        row.clamp(0.0, (self.ny - 1) as f64) as usize
    }

    /// Flat index of the grid point nearest to `(lat, lon)`.
    pub fn index_for(&self, lat: f64, lon: f64) -> WindResult<usize> {
        if !lat.is_finite() {
            return Err(WindError::invalid_parameter("lat", format!("{} is not finite", lat)));
        }
        if !lon.is_finite() {
            return Err(WindError::invalid_parameter("lon", format!("{} is not finite", lon)));
        }

        let index = self.row_for(lat) * self.nx + self.column_for(lon);
        if index >= self.total_points {
            return Err(WindError::IndexOutOfRange {
                index: index as i64,
                total: self.total_points,
            });
        }
        Ok(index)
    }

    /// Coordinates of the grid point at `index`, with longitude in
    /// [-180, 180).
    pub fn point_at(&self, index: usize) -> Option<GridPoint> {
        if index >= self.total_points || index >= self.nx * self.ny {
            return None;
        }
        let row = index / self.nx;
        let col = index % self.nx;

        let lat = self.lat_first - row as f64 * self.lat_step;
        let mut lon = (self.lon_first + col as f64 * self.lon_step).rem_euclid(360.0);
        if lon >= 180.0 {
            lon -= 360.0;
        }
        Some(GridPoint { index, lat, lon })
    }
}

impl Default for GridGeometry {
    fn default() -> Self {
        Self::IFS_0P25
    }
}
