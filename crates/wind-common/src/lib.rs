//! Common types and utilities shared across the wind query crates.

pub mod error;
pub mod grid;
pub mod record;
pub mod run;

pub use error::{WindError, WindResult};
pub use grid::{GridGeometry, GridPoint};
pub use record::{RunRecord, U_FIELD, V_FIELD, WIND_FIELDS};
pub use run::{parse_date, Batch, ProductVariant, RunKey, DATE_FORMAT};
