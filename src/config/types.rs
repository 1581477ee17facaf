use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WatchConfig {
    /// Root of the tree to scan (required)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Time between scans, e.g. "1h" or "15m"
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Keep the HEIC file after a successful conversion
    #[serde(default)]
    pub keep_original: bool,

    /// Keep the .MOV/.mov live-photo sidecar after a successful conversion
    #[serde(default)]
    pub keep_live_photo: bool,

    /// Move converted files into this tree, mirroring their path under `path`
    #[serde(default)]
    pub target: Option<PathBuf>,

    /// Account that should own converted files and created directories
    #[serde(default)]
    pub owner: Option<String>,
}

pub(crate) fn default_interval() -> String {
    "1h".to_string()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            path: None,
            interval: default_interval(),
            keep_original: false,
            keep_live_photo: false,
            target: None,
            owner: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Converter executable; `convert` on PATH when unset
    #[serde(default)]
    pub convert_path: Option<PathBuf>,

    /// Arguments placed before the source and output names
    #[serde(default)]
    pub convert_args: Vec<String>,
}

/// Validated watch settings handed to the scheduler and reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSettings {
    pub watch_root: PathBuf,
    pub interval: Duration,
    pub keep_original: bool,
    pub keep_live_photo: bool,
    pub target_root: Option<PathBuf>,
    pub owner: Option<String>,
}

impl WatchSettings {
    /// Settings for a watch root with default policy: hourly, nothing retained.
    pub fn new(watch_root: impl Into<PathBuf>) -> Self {
        Self {
            watch_root: watch_root.into(),
            interval: Duration::from_secs(3600),
            keep_original: false,
            keep_live_photo: false,
            target_root: None,
            owner: None,
        }
    }
}
