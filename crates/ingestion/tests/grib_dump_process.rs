//! Runs `GribDumpDecoder` against small shell scripts standing in for
//! `grib_dump`.
#![cfg(unix)]

use bytes::Bytes;
use ingestion::{GribDecoder, GribDumpDecoder};
use test_utils::fixtures::grib_dump::grib_dump_output;
use test_utils::{file_names, write_script};
use wind_common::WindError;

fn decoder_for(script: &std::path::Path, staging: &std::path::Path) -> GribDumpDecoder {
    GribDumpDecoder::new(
        "sh",
        vec![script.display().to_string(), "-j".to_string()],
    )
    .with_temp_dir(Some(staging.to_path_buf()))
}

#[tokio::test]
async fn test_decodes_stdout_and_removes_staged_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("staging");
    let output = dir.path().join("output.json");
    let seen = dir.path().join("seen.txt");
    let copy = dir.path().join("copy.grib2");
    std::fs::write(&output, grib_dump_output(&[0.5, 1.5, -3.25])).unwrap();

    // $1 is "-j", $2 is the staged chunk
    let script = write_script(
        dir.path(),
        "fake_grib_dump.sh",
        &format!(
            "test \"$1\" = \"-j\" || exit 9\necho \"$2\" > '{}'\ncp \"$2\" '{}'\ncat '{}'",
            seen.display(),
            copy.display(),
            output.display()
        ),
    );

    let decoder = decoder_for(&script, &staging);
    let values = decoder
        .decode("10u", Bytes::from_static(b"GRIB-chunk-bytes"))
        .await
        .unwrap();

    assert_eq!(values, vec![0.5, 1.5, -3.25]);
    assert_eq!(std::fs::read(&copy).unwrap(), b"GRIB-chunk-bytes");

    let staged = std::fs::read_to_string(&seen).unwrap();
    let staged = std::path::Path::new(staged.trim());
    assert!(staged.starts_with(&staging));
    assert!(staged
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("gribchunk-10u-") && n.ends_with(".grib2"))
        .unwrap_or(false));
    assert!(!staged.exists());
    assert!(file_names(&staging).is_empty());
}

#[tokio::test]
async fn test_failure_carries_diagnostics_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("staging");
    let script = write_script(
        dir.path(),
        "failing_grib_dump.sh",
        "echo 'ECCODES ERROR   :  Wrong message length' >&2\nexit 3",
    );

    let err = decoder_for(&script, &staging)
        .decode("10v", Bytes::from_static(b"truncated"))
        .await
        .unwrap_err();

    match err {
        WindError::Decode {
            field,
            message,
            diagnostics,
        } => {
            assert_eq!(field, "10v");
            assert!(message.contains("exited"));
            assert!(diagnostics.unwrap().contains("Wrong message length"));
        }
        other => panic!("expected Decode, got {:?}", other),
    }
    assert!(file_names(&staging).is_empty());
}

#[tokio::test]
async fn test_non_numeric_output_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("staging");
    let script = write_script(
        dir.path(),
        "odd_grib_dump.sh",
        r#"echo '{"messages": [[{"key": "values", "value": [1.0, null]}]]}'"#,
    );

    let err = decoder_for(&script, &staging)
        .decode("10u", Bytes::from_static(b"GRIB"))
        .await
        .unwrap_err();
    assert!(matches!(err, WindError::Decode { .. }));
}
