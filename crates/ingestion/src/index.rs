//! Run index resolution.
//!
//! Every forecast file is published alongside a `.index` document with one
//! JSON object per GRIB message, e.g.
//!
//! ```text
//! {"domain": "g", "levtype": "sfc", "param": "10u", "_offset": 913, "_length": 609046}
//! ```
//!
//! The offsets locate each message inside the `.grib2` object so only the
//! wind fields need to be fetched.

use std::ops::Range;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use wind_common::{RunKey, WindError, WindResult, WIND_FIELDS};

use crate::config::AcquisitionConfig;

/// Level type of the 10 m wind fields in the index.
pub const SURFACE_LEVTYPE: &str = "sfc";

/// Location of one field's GRIB message inside the remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub field: String,
    pub offset: u64,
    pub length: u64,
}

impl ChunkDescriptor {
    /// Byte range `[offset, offset + length)`.
    pub fn range(&self) -> Range<u64> {
        self.offset..self.offset.saturating_add(self.length)
    }
}

/// One line of the index document. Other keys are ignored.
///
/// Offsets are plain JSON numbers and may be written with a fraction
/// (`913.0`); they are checked by [`byte_count`].
#[derive(Debug, Deserialize)]
struct IndexLine {
    param: String,
    levtype: String,
    #[serde(rename = "_offset")]
    offset: f64,
    #[serde(rename = "_length")]
    length: f64,
}

/// 2^64, the first value past `u64::MAX`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn byte_count(value: f64, key: &str) -> Result<u64, String> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= U64_LIMIT {
        return Err(format!("{} must be a non-negative whole number, got {}", key, value));
    }
    Ok(value as u64)
}

/// Fetches run index documents over plain HTTPS.
pub struct IndexResolver {
    client: Client,
    base_url: String,
    bucket: String,
}

impl IndexResolver {
    /// Create a resolver from acquisition settings.
    pub fn new(config: &AcquisitionConfig) -> WindResult<Self> {
        let client = Client::builder()
            .timeout(config.index_timeout())
            .build()
            .map_err(|e| WindError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.index_base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        })
    }

    /// Public URL of the index document for `key`.
    pub fn index_url(&self, key: &RunKey) -> String {
        format!("{}/{}/{}", self.base_url, self.bucket, key.object_path(".index"))
    }

    /// Fetch the index for `key` and return the wind field descriptors.
    #[instrument(skip(self), fields(run = %key))]
    pub async fn resolve(&self, key: &RunKey) -> WindResult<Vec<ChunkDescriptor>> {
        let url = self.index_url(key);
        debug!(url = %url, "Fetching run index");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WindError::IndexFetch {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(WindError::IndexFetch {
                url,
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(|e| WindError::IndexFetch {
            url: url.clone(),
            message: format!("failed to read body: {}", e),
        })?;

        parse_index(&body, &url)
    }
}

/// Parse an index document and select the 10u/10v surface descriptors.
///
/// Every non-blank line must parse; a single malformed line rejects the
/// whole index.
pub fn parse_index(body: &str, url: &str) -> WindResult<Vec<ChunkDescriptor>> {
    let mut descriptors: Vec<ChunkDescriptor> = Vec::with_capacity(WIND_FIELDS.len());

    for (number, line) in body.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parse_error = |message: String| WindError::IndexParse {
            url: url.to_string(),
            line: number + 1,
            message,
        };

        let entry: IndexLine =
            serde_json::from_str(line).map_err(|e| parse_error(e.to_string()))?;
        let offset = byte_count(entry.offset, "_offset").map_err(parse_error)?;
        let length = byte_count(entry.length, "_length").map_err(parse_error)?;
        if offset.checked_add(length).is_none() {
            return Err(parse_error(format!(
                "_offset {} + _length {} overflows",
                offset, length
            )));
        }

        if entry.levtype != SURFACE_LEVTYPE || !WIND_FIELDS.contains(&entry.param.as_str()) {
            continue;
        }

        if descriptors.iter().any(|d| d.field == entry.param) {
            warn!(field = %entry.param, line = number + 1, "Duplicate index entry ignored");
            continue;
        }

        descriptors.push(ChunkDescriptor {
            field: entry.param,
            offset,
            length,
        });
    }

    if descriptors.is_empty() {
        return Err(WindError::EmptyIndex {
            url: url.to_string(),
        });
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::index::{sample_index, SAMPLE_U_LENGTH, SAMPLE_U_OFFSET};

    const URL: &str = "https://example.com/run.index";

    #[test]
    fn test_parse_selects_surface_wind() {
        let descriptors = parse_index(&sample_index(), URL).unwrap();

        assert_eq!(descriptors.len(), 2);
        let u = descriptors.iter().find(|d| d.field == "10u").unwrap();
        assert_eq!(u.offset, SAMPLE_U_OFFSET);
        assert_eq!(u.length, SAMPLE_U_LENGTH);
        assert_eq!(u.range(), SAMPLE_U_OFFSET..SAMPLE_U_OFFSET + SAMPLE_U_LENGTH);
        assert!(descriptors.iter().any(|d| d.field == "10v"));
    }

    #[test]
    fn test_parse_ignores_other_levels() {
        let body = r#"{"param": "10u", "levtype": "pl", "_offset": 0, "_length": 10}
{"param": "2t", "levtype": "sfc", "_offset": 10, "_length": 10}
{"param": "10v", "levtype": "sfc", "_offset": 20, "_length": 10}"#;

        let descriptors = parse_index(body, URL).unwrap();
        assert_eq!(
            descriptors,
            vec![ChunkDescriptor {
                field: "10v".to_string(),
                offset: 20,
                length: 10
            }]
        );
    }

    #[test]
    fn test_parse_malformed_line_fails_whole_index() {
        let body = r#"{"param": "10u", "levtype": "sfc", "_offset": 0, "_length": 10}
not json
{"param": "10v", "levtype": "sfc", "_offset": 20, "_length": 10}"#;

        match parse_index(body, URL) {
            Err(WindError::IndexParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected IndexParse, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_required_key_fails() {
        let body = r#"{"param": "10u", "levtype": "sfc", "_offset": 0}"#;
        assert!(matches!(
            parse_index(body, URL),
            Err(WindError::IndexParse { .. })
        ));
    }

    #[test]
    fn test_parse_empty_selection() {
        let body = r#"{"param": "2t", "levtype": "sfc", "_offset": 0, "_length": 10}

"#;
        assert!(matches!(
            parse_index(body, URL),
            Err(WindError::EmptyIndex { .. })
        ));
        assert!(matches!(parse_index("", URL), Err(WindError::EmptyIndex { .. })));
    }

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let body = r#"{"param": "10u", "levtype": "sfc", "_offset": 0, "_length": 10}
{"param": "10u", "levtype": "sfc", "_offset": 99, "_length": 10}"#;
        let descriptors = parse_index(body, URL).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].offset, 0);
    }

    #[test]
    fn test_index_url_uses_variant_path() {
        let resolver = IndexResolver::new(&AcquisitionConfig::default()).unwrap();

        let oper = RunKey::parse("20240101", "12z").unwrap();
        assert_eq!(
            resolver.index_url(&oper),
            "https://storage.googleapis.com/ecmwf-open-data/20240101/12z/ifs/0p25/oper/20240101120000-0h-oper-fc.index"
        );

        let scda = RunKey::parse("20240101", "06z").unwrap();
        assert!(resolver
            .index_url(&scda)
            .ends_with("/20240101/06z/ifs/0p25/scda/20240101060000-0h-scda-fc.index"));
    }

    #[test]
    fn test_parse_accepts_whole_float_offsets() {
        let body = r#"{"param": "10u", "levtype": "sfc", "_offset": 913.0, "_length": 609046.0}"#;
        let descriptors = parse_index(body, URL).unwrap();
        assert_eq!(descriptors[0].offset, 913);
        assert_eq!(descriptors[0].length, 609046);
    }

    #[test]
    fn test_parse_rejects_bad_byte_counts() {
        for body in [
            r#"{"param": "10u", "levtype": "sfc", "_offset": -1, "_length": 10}"#,
            r#"{"param": "10u", "levtype": "sfc", "_offset": 0.5, "_length": 10}"#,
            r#"{"param": "10u", "levtype": "sfc", "_offset": 1e300, "_length": 10}"#,
        ] {
            assert!(
                matches!(parse_index(body, URL), Err(WindError::IndexParse { line: 1, .. })),
                "{}",
                body
            );
        }
    }

    #[test]
    fn test_parse_rejects_overflowing_range() {
        let body = r#"{"param": "10u", "levtype": "sfc", "_offset": 913, "_length": 10}
{"param": "10v", "levtype": "sfc", "_offset": 10000000000000000000, "_length": 10000000000000000000}"#;

        match parse_index(body, URL) {
            Err(WindError::IndexParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected IndexParse, got {:?}", other),
        }
    }
}
