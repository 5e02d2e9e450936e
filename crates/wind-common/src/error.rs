//! Error types for the wind query crates.

use thiserror::Error;

use crate::run::RunKey;

/// Result type alias using WindError.
pub type WindResult<T> = Result<T, WindError>;

/// Primary error type for wind data acquisition and queries.
#[derive(Debug, Error)]
pub enum WindError {
    // === Request Errors ===
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Grid Errors ===
    #[error("Grid index {index} out of range [0, {total})")]
    IndexOutOfRange { index: i64, total: usize },

    #[error("Index {index} out of bounds for record of length {len}")]
    OutOfBounds { index: usize, len: usize },

    #[error("No data found: {0}")]
    NoData(String),

    // === Acquisition Errors ===
    #[error("Failed to fetch index {url}: {message}")]
    IndexFetch { url: String, message: String },

    #[error("Malformed index {url} at line {line}: {message}")]
    IndexParse {
        url: String,
        line: usize,
        message: String,
    },

    #[error("Index {url} has no 10u/10v surface entries")]
    EmptyIndex { url: String },

    #[error("Failed to acquire {field} for run {key} from {path}: {message}")]
    Acquisition {
        key: RunKey,
        field: String,
        path: String,
        message: String,
    },

    #[error("Failed to decode {field}: {message}")]
    Decode {
        field: String,
        message: String,
        /// Output captured from the external decoder, if any.
        diagnostics: Option<String>,
    },

    #[error("Invalid run record: {0}")]
    InvalidRecord(String),

    // === Cache Errors ===
    #[error("Run artifact {path} does not exist")]
    ArtifactMissing { path: String },

    #[error("Corrupt or unreadable run artifact {path}: {message}")]
    CorruptArtifact { path: String, message: String },

    #[error("Download failed for run {key}: {source}")]
    DownloadFailed {
        key: RunKey,
        #[source]
        source: Box<WindError>,
    },

    #[error("Read/parse failed after download for run {key}: {source}")]
    ReadAfterDownload {
        key: RunKey,
        #[source]
        source: Box<WindError>,
    },

    // === Infrastructure Errors ===
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl WindError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a Decode error without decoder output.
    pub fn decode(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            field: field.into(),
            message: message.into(),
            diagnostics: None,
        }
    }

    /// Create a CorruptArtifact error.
    pub fn corrupt_artifact(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptArtifact {
            path: path.into(),
            message: message.into(),
        }
    }

    /// True for request validation failures, which are never worth retrying.
    pub fn is_parameter_error(&self) -> bool {
        matches!(
            self,
            WindError::MissingParameter(_) | WindError::InvalidParameter { .. }
        )
    }

    /// True when the remote acquisition pipeline failed, as opposed to
    /// a local read of the cached artifact.
    pub fn is_download_failure(&self) -> bool {
        matches!(self, WindError::DownloadFailed { .. })
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            WindError::MissingParameter(_)
            | WindError::InvalidParameter { .. }
            | WindError::OutOfBounds { .. } => 400,

            WindError::NoData(_) | WindError::EmptyIndex { .. } => 404,

            WindError::DownloadFailed { .. }
            | WindError::IndexFetch { .. }
            | WindError::Acquisition { .. } => 502,

            _ => 500,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for WindError {
    fn from(err: std::io::Error) -> Self {
        WindError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for WindError {
    fn from(err: serde_json::Error) -> Self {
        WindError::InternalError(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Batch;
    use chrono::NaiveDate;

    fn key() -> RunKey {
        RunKey::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), Batch::Z00)
    }

    #[test]
    fn test_download_failure_is_distinguishable() {
        let download = WindError::DownloadFailed {
            key: key(),
            source: Box::new(WindError::EmptyIndex {
                url: "https://example.com/x.index".to_string(),
            }),
        };
        let reread = WindError::ReadAfterDownload {
            key: key(),
            source: Box::new(WindError::corrupt_artifact("tmp/x.json", "truncated")),
        };

        assert!(download.is_download_failure());
        assert!(!reread.is_download_failure());
        assert!(download.to_string().starts_with("Download failed for run 20240101-00z"));
        assert!(reread.to_string().contains("after download"));
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(WindError::MissingParameter("lat".into()).http_status_code(), 400);
        assert_eq!(WindError::NoData("none".into()).http_status_code(), 404);
        assert_eq!(WindError::InternalError("x".into()).http_status_code(), 500);
    }
}
