//! Acquisition configuration.
//!
//! Controls where run indexes are fetched from and how GRIB chunks are
//! decoded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decoder::{EmbeddedGribDecoder, GribDecoder, GribDumpDecoder};

/// How downloaded GRIB chunks are turned into values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecoderConfig {
    /// ecCodes `grib_dump -j <file>` as a subprocess
    GribDump {
        #[serde(default = "default_grib_dump_program")]
        program: String,
        #[serde(default = "default_grib_dump_args")]
        args: Vec<String>,
    },
    /// In-process decoding with the `grib` crate
    Embedded,
}

fn default_grib_dump_program() -> String {
    "grib_dump".to_string()
}

fn default_grib_dump_args() -> Vec<String> {
    vec!["-j".to_string()]
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig::GribDump {
            program: default_grib_dump_program(),
            args: default_grib_dump_args(),
        }
    }
}

impl DecoderConfig {
    /// Build the configured decoder. Staged chunk files go to `temp_dir`
    /// (system temp dir when `None`).
    pub fn build(&self, temp_dir: Option<PathBuf>) -> Arc<dyn GribDecoder> {
        match self {
            DecoderConfig::GribDump { program, args } => Arc::new(
                GribDumpDecoder::new(program.clone(), args.clone()).with_temp_dir(temp_dir),
            ),
            DecoderConfig::Embedded => Arc::new(EmbeddedGribDecoder),
        }
    }
}

/// Settings for the index resolver and chunk acquirer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Public HTTPS endpoint serving the bucket's index documents
    pub index_base_url: String,
    /// Bucket holding the forecast files
    pub bucket: String,
    /// Timeout for index requests
    pub index_timeout_secs: u64,
    /// Chunk decoder
    pub decoder: DecoderConfig,
    /// Directory for staged chunk files
    pub temp_dir: Option<PathBuf>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            index_base_url: "https://storage.googleapis.com".to_string(),
            bucket: "ecmwf-open-data".to_string(),
            index_timeout_secs: 60,
            decoder: DecoderConfig::default(),
            temp_dir: None,
        }
    }
}

impl AcquisitionConfig {
    pub fn index_timeout(&self) -> Duration {
        Duration::from_secs(self.index_timeout_secs)
    }
}
