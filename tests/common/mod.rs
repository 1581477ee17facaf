//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Converter stand-in: copies the source to the output name, or fails with a
/// message on stderr when the source name starts with `fail`.
const CONVERTER_SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  fail*) echo "convert: no decode delegate for this image format" >&2; exit 1 ;;
esac
cp "$1" "$2"
"#;

/// Write the shell converter into `dir` and return its path.
#[cfg(unix)]
pub fn write_converter(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-convert");
    std::fs::write(&path, CONVERTER_SCRIPT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Create a file (and its parent directories) with placeholder content.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"heic").unwrap();
}

/// Every file under `root`, relative to it, sorted.
pub fn files_under(root: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Environment variables read by heicwatch.
pub const ENV_VARS: [&str; 7] = [
    "WATCH",
    "TIME_BETWEEN",
    "KEEP_ORIGINAL",
    "KEEP_LIVE_PHOTO",
    "TARGET",
    "OWNER",
    "CONVERT_BIN",
];
