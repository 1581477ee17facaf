//! Locating the converter executable.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default name of the converter executable looked up on `PATH`.
pub const DEFAULT_CONVERTER: &str = "convert";

/// First line of `<program> -version`, if the program runs and succeeds.
///
/// ```no_run
/// use heicwatch_convert::tools::converter_version;
/// use std::path::Path;
///
/// if let Some(version) = converter_version(Path::new("/usr/bin/convert")) {
///     println!("{version}");
/// }
/// ```
pub fn converter_version(program: &Path) -> Option<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
}

fn find_on_path(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| Error::tool_not_found(name))
}

/// Get the path to a tool, preferring a configured path over PATH lookup.
///
/// A configured bare name (no directory part) is looked up on `PATH`.
pub fn get_tool_path(name: &str, config_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_path {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        if path.parent().is_some_and(|p| !p.as_os_str().is_empty()) {
            return Err(Error::file_not_found(path));
        }
        return find_on_path(&path.to_string_lossy());
    }

    find_on_path(name)
}
