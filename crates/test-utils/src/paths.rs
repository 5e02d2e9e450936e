//! Scratch locations for tests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Fresh directory for run artifacts, removed when dropped.
pub fn temp_cache_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("wind-cache-")
        .tempdir()
        .expect("failed to create temp cache dir")
}

/// Write a shell script to `dir/name` and return its path.
///
/// Run it as `sh <path>` rather than executing it directly.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("failed to write script");
    path
}

/// Names of the regular files in `dir`, sorted.
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter_map(|e| e.file_name().into_string().ok())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
