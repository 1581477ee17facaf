mod duration;
mod types;

pub use duration::{parse_duration, DurationError};
pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variables read at startup; they override the config file.
pub mod env {
    pub const WATCH: &str = "WATCH";
    pub const TIME_BETWEEN: &str = "TIME_BETWEEN";
    pub const KEEP_ORIGINAL: &str = "KEEP_ORIGINAL";
    pub const KEEP_LIVE_PHOTO: &str = "KEEP_LIVE_PHOTO";
    pub const TARGET: &str = "TARGET";
    pub const OWNER: &str = "OWNER";
    pub const CONVERT_BIN: &str = "CONVERT_BIN";
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./heicwatch.toml",
        "~/.config/heicwatch/config.toml",
        "/etc/heicwatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Load the config file (if any), apply environment overrides and validate.
pub fn load_settings(custom_path: Option<&Path>) -> Result<(Config, WatchSettings)> {
    let mut config = load_config_or_default(custom_path)?;
    apply_env(&mut config, |key| std::env::var(key).ok())?;
    let settings = validate_config(&config)?;
    Ok((config, settings))
}

/// Override config values from environment variables.
///
/// `lookup` returns the value of a variable; empty values count as unset.
pub fn apply_env<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(watch) = get(env::WATCH) {
        config.watch.path = Some(PathBuf::from(watch));
    }

    match get(env::TIME_BETWEEN) {
        Some(interval) => config.watch.interval = interval,
        None => tracing::info!(
            "{} not specified, converting every {}",
            env::TIME_BETWEEN,
            config.watch.interval
        ),
    }

    match get(env::KEEP_ORIGINAL) {
        Some(value) => config.watch.keep_original = parse_flag(env::KEEP_ORIGINAL, &value)?,
        None => tracing::info!(
            "{} not specified, using {}",
            env::KEEP_ORIGINAL,
            config.watch.keep_original
        ),
    }

    match get(env::KEEP_LIVE_PHOTO) {
        Some(value) => config.watch.keep_live_photo = parse_flag(env::KEEP_LIVE_PHOTO, &value)?,
        None => tracing::info!(
            "{} not specified, using {}",
            env::KEEP_LIVE_PHOTO,
            config.watch.keep_live_photo
        ),
    }

    if let Some(target) = get(env::TARGET) {
        config.watch.target = Some(PathBuf::from(target));
    }

    if let Some(owner) = get(env::OWNER) {
        config.watch.owner = Some(owner);
    }

    if let Some(convert) = get(env::CONVERT_BIN) {
        config.tools.convert_path = Some(PathBuf::from(convert));
    }

    Ok(())
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false, got {:?}", key, other),
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Validate configuration and resolve it into typed watch settings
pub fn validate_config(config: &Config) -> Result<WatchSettings> {
    let watch_root = match &config.watch.path {
        Some(path) => expand(path),
        None => anyhow::bail!(
            "No folder to watch specified. Set the {} environment variable or watch.path",
            env::WATCH
        ),
    };

    let interval = parse_duration(&config.watch.interval)
        .with_context(|| format!("Failed to parse interval {:?}", config.watch.interval))?;

    if !watch_root.exists() {
        tracing::warn!("Watch path does not exist: {:?}", watch_root);
    }

    let target_root = config.watch.target.as_deref().map(expand);
    if let Some(target) = &target_root {
        if target == &watch_root {
            anyhow::bail!(
                "Target folder {:?} must differ from the watched folder",
                target
            );
        }
    }

    let owner = config
        .watch
        .owner
        .as_ref()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty());

    Ok(WatchSettings {
        watch_root,
        interval,
        keep_original: config.watch.keep_original,
        keep_live_photo: config.watch.keep_live_photo,
        target_root,
        owner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn settings_from(pairs: &[(&str, &str)]) -> Result<WatchSettings> {
        let mut config = Config::default();
        apply_env(&mut config, env_of(pairs))?;
        validate_config(&config)
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[(env::WATCH, "/photos")]).unwrap();
        assert_eq!(settings, WatchSettings::new("/photos"));
    }

    #[test]
    fn test_missing_watch_is_fatal() {
        let err = settings_from(&[]).unwrap_err();
        assert!(err.to_string().contains("WATCH"));

        let err = settings_from(&[(env::WATCH, "  ")]).unwrap_err();
        assert!(err.to_string().contains("WATCH"));
    }

    #[test]
    fn test_env_overrides() {
        let settings = settings_from(&[
            (env::WATCH, "/photos"),
            (env::TIME_BETWEEN, "15m"),
            (env::KEEP_ORIGINAL, "true"),
            (env::KEEP_LIVE_PHOTO, "TRUE"),
            (env::TARGET, "/archive"),
            (env::OWNER, "photos"),
        ])
        .unwrap();

        assert_eq!(settings.interval, Duration::from_secs(900));
        assert!(settings.keep_original);
        assert!(settings.keep_live_photo);
        assert_eq!(settings.target_root, Some(PathBuf::from("/archive")));
        assert_eq!(settings.owner.as_deref(), Some("photos"));
    }

    #[test]
    fn test_malformed_interval_is_fatal() {
        let err = settings_from(&[(env::WATCH, "/photos"), (env::TIME_BETWEEN, "hourly")])
            .unwrap_err();
        assert!(format!("{err:#}").contains("hourly"));
    }

    #[test]
    fn test_malformed_flag_is_fatal() {
        let err = settings_from(&[(env::WATCH, "/photos"), (env::KEEP_ORIGINAL, "maybe")])
            .unwrap_err();
        assert!(err.to_string().contains(env::KEEP_ORIGINAL));
    }

    #[test]
    fn test_target_equal_to_watch_is_rejected() {
        let err = settings_from(&[(env::WATCH, "/photos"), (env::TARGET, "/photos")]).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heicwatch.toml");
        std::fs::write(
            &path,
            r#"
[watch]
path = "/from-file"
interval = "2h"
keep_original = true

[tools]
convert_path = "/opt/im/bin/magick"
convert_args = ["convert"]
"#,
        )
        .unwrap();

        let mut config = load_config(&path).unwrap();
        assert_eq!(config.tools.convert_args, vec!["convert".to_string()]);

        apply_env(&mut config, env_of(&[(env::WATCH, "/from-env")])).unwrap();
        let settings = validate_config(&config).unwrap();

        assert_eq!(settings.watch_root, PathBuf::from("/from-env"));
        assert_eq!(settings.interval, Duration::from_secs(7200));
        assert!(settings.keep_original);
        assert_eq!(
            config.tools.convert_path,
            Some(PathBuf::from("/opt/im/bin/magick"))
        );
    }

    #[test]
    fn test_invalid_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[watch\npath = 1").unwrap();

        assert!(load_config(&path).is_err());
        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
