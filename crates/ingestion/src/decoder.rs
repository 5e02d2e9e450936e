//! GRIB2 chunk decoding.
//!
//! A chunk is a single GRIB message cut out of the remote file. Two decoders
//! are available:
//!
//! - [`GribDumpDecoder`] stages the chunk in a scoped temp file and runs
//!   `grib_dump -j`, reading the `values` key from its JSON output.
//! - [`EmbeddedGribDecoder`] decodes in-process with the `grib` crate.

use std::io::Cursor;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

use wind_common::{WindError, WindResult};

/// Turns one GRIB message into its grid values.
#[async_trait]
pub trait GribDecoder: Send + Sync {
    /// Decode `data` (the message for `field`) into a flat value array.
    async fn decode(&self, field: &str, data: Bytes) -> WindResult<Vec<f64>>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Runs an external `grib_dump`-compatible program.
#[derive(Debug, Clone)]
pub struct GribDumpDecoder {
    program: String,
    args: Vec<String>,
    temp_dir: Option<PathBuf>,
}

impl GribDumpDecoder {
    /// `program` is invoked as `program <args...> <chunk file>`.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            temp_dir: None,
        }
    }

    pub fn with_temp_dir(mut self, temp_dir: Option<PathBuf>) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    fn stage(&self, field: &str, data: &[u8]) -> WindResult<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        let prefix = format!("gribchunk-{}-", field);
        builder.prefix(&prefix).suffix(".grib2");

        let mut file = match &self.temp_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempfile_in(dir)?
            }
            None => builder.tempfile()?,
        };

        std::io::Write::write_all(file.as_file_mut(), data)?;
        file.as_file().sync_all()?;
        Ok(file)
    }
}

impl Default for GribDumpDecoder {
    fn default() -> Self {
        Self::new("grib_dump", vec!["-j".to_string()])
    }
}

#[async_trait]
impl GribDecoder for GribDumpDecoder {
    #[instrument(skip(self, data), fields(program = %self.program, bytes = data.len()))]
    async fn decode(&self, field: &str, data: Bytes) -> WindResult<Vec<f64>> {
        // Removed when dropped, on every path out of this function.
        let staged = self.stage(field, &data)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(staged.path())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                WindError::decode(field, format!("failed to run {}: {}", self.program, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            let diagnostics = match (stderr.is_empty(), stdout.is_empty()) {
                (true, true) => None,
                (false, true) => Some(stderr),
                (true, false) => Some(stdout),
                (false, false) => Some(format!("{}\n{}", stderr, stdout)),
            };

            warn!(
                field = %field,
                status = %output.status,
                diagnostics = diagnostics.as_deref().unwrap_or(""),
                "Decoder exited with failure"
            );

            return Err(WindError::Decode {
                field: field.to_string(),
                message: format!("{} exited with {}", self.program, output.status),
                diagnostics,
            });
        }

        let values = parse_grib_dump_json(field, &output.stdout)?;
        debug!(field = %field, values = values.len(), "Decoded chunk");
        Ok(values)
    }

    fn name(&self) -> &'static str {
        "grib_dump"
    }
}

/// Extract the `values` array from `grib_dump -j` output.
///
/// Output shape: `{"messages": [[{"key": "...", "value": ...}, ...]]}`.
/// Only the first message is read.
pub fn parse_grib_dump_json(field: &str, output: &[u8]) -> WindResult<Vec<f64>> {
    let document: Value = serde_json::from_slice(output)
        .map_err(|e| WindError::decode(field, format!("decoder output is not JSON: {}", e)))?;

    let message = document
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(Value::as_array)
        .ok_or_else(|| WindError::decode(field, "decoder output has no messages"))?;

    let values = message
        .iter()
        .find(|entry| entry.get("key").and_then(Value::as_str) == Some("values"))
        .and_then(|entry| entry.get("value"))
        .and_then(Value::as_array)
        .ok_or_else(|| WindError::decode(field, "message has no values array"))?;

    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().ok_or_else(|| {
                WindError::decode(field, format!("value {} is not a number: {}", i, v))
            })
        })
        .collect()
}

/// In-process decoder backed by the `grib` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedGribDecoder;

#[async_trait]
impl GribDecoder for EmbeddedGribDecoder {
    async fn decode(&self, field: &str, data: Bytes) -> WindResult<Vec<f64>> {
        let owned_field = field.to_string();
        tokio::task::spawn_blocking(move || decode_embedded(&owned_field, data))
            .await
            .map_err(|e| WindError::InternalError(format!("decode task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "embedded"
    }
}

fn decode_embedded(field: &str, data: Bytes) -> WindResult<Vec<f64>> {
    let grib_file = grib::from_reader(Cursor::new(data.to_vec()))
        .map_err(|e| WindError::decode(field, format!("not a GRIB2 message: {}", e)))?;

    let (_, submessage) = grib_file
        .iter()
        .next()
        .ok_or_else(|| WindError::decode(field, "chunk contains no GRIB2 submessage"))?;

    let decoder = grib::Grib2SubmessageDecoder::from(submessage)
        .map_err(|e| WindError::decode(field, format!("unsupported message: {}", e)))?;
    let values = decoder
        .dispatch()
        .map_err(|e| WindError::decode(field, format!("failed to unpack values: {}", e)))?;

    Ok(values.map(f64::from).collect())
}
