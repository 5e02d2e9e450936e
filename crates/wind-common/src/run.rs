//! Forecast run identification.
//!
//! A run is one published IFS forecast dataset, identified by the calendar
//! day it was issued and the forecast cycle (batch) within that day.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{WindError, WindResult};

/// Date format used in run keys, remote paths and query parameters.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// One of the four daily forecast cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Batch {
    #[serde(rename = "00z")]
    Z00,
    #[serde(rename = "06z")]
    Z06,
    #[serde(rename = "12z")]
    Z12,
    #[serde(rename = "18z")]
    Z18,
}

impl Batch {
    pub const ALL: [Batch; 4] = [Batch::Z00, Batch::Z06, Batch::Z12, Batch::Z18];

    /// Label as used in remote paths, e.g. `"06z"`.
    pub fn label(&self) -> &'static str {
        match self {
            Batch::Z00 => "00z",
            Batch::Z06 => "06z",
            Batch::Z12 => "12z",
            Batch::Z18 => "18z",
        }
    }

    /// Cycle hour, e.g. `"06"`.
    pub fn hour(&self) -> &'static str {
        &self.label()[..2]
    }

    /// The main cycles (00z/12z) publish the `oper` stream; the
    /// intermediate cycles (06z/18z) publish `scda`.
    pub fn product_variant(&self) -> ProductVariant {
        match self {
            Batch::Z00 | Batch::Z12 => ProductVariant::Oper,
            Batch::Z06 | Batch::Z18 => ProductVariant::Scda,
        }
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Batch {
    type Err = WindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "00z" => Ok(Batch::Z00),
            "06z" => Ok(Batch::Z06),
            "12z" => Ok(Batch::Z12),
            "18z" => Ok(Batch::Z18),
            _ => Err(WindError::invalid_parameter(
                "batch",
                format!("'{}' is not one of 00z, 06z, 12z, 18z", s),
            )),
        }
    }
}

/// IFS product stream, which selects the remote path scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductVariant {
    Oper,
    Scda,
}

impl ProductVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductVariant::Oper => "oper",
            ProductVariant::Scda => "scda",
        }
    }
}

impl fmt::Display for ProductVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies exactly one remote dataset and one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunKey {
    date: NaiveDate,
    batch: Batch,
}

impl RunKey {
    pub fn new(date: NaiveDate, batch: Batch) -> Self {
        Self { date, batch }
    }

    /// Parse a key from its query form, e.g. `("20240101", "00z")`.
    pub fn parse(date: &str, batch: &str) -> WindResult<Self> {
        Ok(Self::new(parse_date("date", date)?, batch.parse()?))
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn batch(&self) -> Batch {
        self.batch
    }

    /// `yyyymmdd` form of the run date.
    pub fn date_string(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    /// Object path of a run file relative to the bucket root.
    ///
    /// `suffix` is the file extension including the dot (`.grib2`, `.index`).
    pub fn object_path(&self, suffix: &str) -> String {
        let date = self.date_string();
        let variant = self.batch.product_variant();
        format!(
            "{date}/{batch}/ifs/0p25/{variant}/{date}{hour}0000-0h-{variant}-fc{suffix}",
            date = date,
            batch = self.batch,
            variant = variant,
            hour = self.batch.hour(),
            suffix = suffix,
        )
    }

    /// File name of the persisted artifact for this run.
    pub fn artifact_name(&self) -> String {
        format!("{}.json", self)
    }
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.date_string(), self.batch)
    }
}

/// Parse a strict `yyyymmdd` date. `param` names the offending parameter
/// in the error.
pub fn parse_date(param: &str, value: &str) -> WindResult<NaiveDate> {
    let value = value.trim();
    if value.len() != 8 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WindError::invalid_parameter(
            param,
            format!("'{}' is not in yyyymmdd format", value),
        ));
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        WindError::invalid_parameter(param, format!("'{}' is not a valid date: {}", value, e))
    })
}
