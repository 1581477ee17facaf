//! File name utilities.
//!
//! Splits file names into base name and extension and derives the names of
//! the files that belong to a still image: its converted JPEG and its
//! live-photo sidecars.

/// Extension of the legacy image format, compared case-insensitively.
pub const LEGACY_EXTENSION: &str = "heic";

/// Extension of the converted output, compared case-sensitively.
pub const CONVERTED_EXTENSION: &str = "jpg";

/// The only recognized spellings of a live-photo sidecar extension.
pub const LIVE_PHOTO_EXTENSIONS: &[&str] = &["MOV", "mov"];

/// Split a file name into `(base, extension)` at the last dot.
///
/// A name without a dot has an empty extension. Names with several dots keep
/// everything before the last one as the base.
///
/// # Examples
///
/// ```
/// use heicwatch_common::paths::split_file_name;
///
/// assert_eq!(split_file_name("IMG.HEIC"), ("IMG", "HEIC"));
/// assert_eq!(split_file_name("README"), ("README", ""));
/// assert_eq!(split_file_name("trip.2023.heic"), ("trip.2023", "heic"));
/// assert_eq!(split_file_name(".heic"), ("", "heic"));
/// ```
#[must_use]
pub fn split_file_name(name: &str) -> (&str, &str) {
    name.rsplit_once('.').unwrap_or((name, ""))
}

/// Check whether an extension names the legacy image format.
///
/// # Examples
///
/// ```
/// use heicwatch_common::paths::is_legacy_extension;
///
/// assert!(is_legacy_extension("heic"));
/// assert!(is_legacy_extension("HEIC"));
/// assert!(!is_legacy_extension("jpg"));
/// ```
#[must_use]
pub fn is_legacy_extension(extension: &str) -> bool {
    extension.to_lowercase() == LEGACY_EXTENSION
}

/// Name of the converted output for a base name.
#[must_use]
pub fn converted_name(base: &str) -> String {
    format!("{base}.{CONVERTED_EXTENSION}")
}

/// Candidate live-photo sidecar names for a base name, in lookup order.
#[must_use]
pub fn live_photo_names(base: &str) -> Vec<String> {
    LIVE_PHOTO_EXTENSIONS
        .iter()
        .map(|ext| format!("{base}.{ext}"))
        .collect()
}
