//! Directory listings and companion-file lookup.
//!
//! A [`DirListing`] is a snapshot of one directory taken once per walk step.
//! Both the idempotency check and the live-photo lookup run against that
//! snapshot instead of probing the filesystem per candidate name.

use crate::paths::{converted_name, live_photo_names};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEntry {
    /// Raw file name as returned by the filesystem.
    pub file_name: OsString,
    /// Whether the entry itself is a directory (symlinks are not followed).
    pub is_dir: bool,
}

impl ListedEntry {
    /// File name as UTF-8, if it is valid UTF-8.
    pub fn name(&self) -> Option<&str> {
        self.file_name.to_str()
    }
}

/// Snapshot of the entries of a single directory.
#[derive(Debug, Clone, Default)]
pub struct DirListing {
    dir: PathBuf,
    entries: Vec<ListedEntry>,
}

impl DirListing {
    /// Read a directory, in the order the filesystem returns its entries.
    pub fn read(dir: &Path) -> std::io::Result<Self> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(ListedEntry {
                file_name: entry.file_name(),
                is_dir,
            });
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    /// Build a listing from known entries.
    pub fn from_entries(dir: impl Into<PathBuf>, entries: Vec<ListedEntry>) -> Self {
        Self {
            dir: dir.into(),
            entries,
        }
    }

    /// An empty listing for a directory that could not be read.
    pub fn empty(dir: impl Into<PathBuf>) -> Self {
        Self::from_entries(dir, Vec::new())
    }

    /// The listed directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The listed entries.
    pub fn entries(&self) -> &[ListedEntry] {
        &self.entries
    }

    /// Whether an entry with exactly this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.file_name == name)
    }

    /// Whether `<base>.jpg` is present in this listing.
    ///
    /// # Examples
    ///
    /// ```
    /// use heicwatch_common::{DirListing, ListedEntry};
    ///
    /// let listing = DirListing::from_entries(
    ///     "/photos",
    ///     vec![ListedEntry { file_name: "done.jpg".into(), is_dir: false }],
    /// );
    /// assert!(listing.is_already_converted("done"));
    /// assert!(!listing.is_already_converted("todo"));
    /// ```
    pub fn is_already_converted(&self, base: &str) -> bool {
        self.contains(&converted_name(base))
    }

    /// Full path of the live-photo sidecar of `base`, if one is listed.
    ///
    /// Only `<base>.MOV` and `<base>.mov` match; other casings do not.
    pub fn find_live_photo(&self, base: &str) -> Option<PathBuf> {
        let candidates = live_photo_names(base);
        self.entries
            .iter()
            .filter(|e| !e.is_dir)
            .find(|e| candidates.iter().any(|c| e.file_name == c.as_str()))
            .map(|e| self.dir.join(&e.file_name))
    }
}

/// Whether `<base>.jpg` exists in `dir`.
///
/// A directory that cannot be listed (for example because it does not exist
/// yet) counts as "not converted".
pub fn is_converted_in(dir: &Path, base: &str) -> bool {
    DirListing::read(dir)
        .map(|listing| listing.is_already_converted(base))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn file(name: &str) -> ListedEntry {
        ListedEntry {
            file_name: name.into(),
            is_dir: false,
        }
    }

    fn listing(names: &[&str]) -> DirListing {
        DirListing::from_entries("/photos", names.iter().map(|n| file(n)).collect())
    }

    #[test]
    fn test_already_converted_is_case_sensitive() {
        let l = listing(&["done.HEIC", "done.jpg", "other.JPG"]);
        assert!(l.is_already_converted("done"));
        assert!(!l.is_already_converted("other"));
        assert!(!l.is_already_converted("missing"));
    }

    #[test]
    fn test_find_live_photo_exact_casings() {
        let l = listing(&["a.heic", "a.MOV"]);
        assert_eq!(l.find_live_photo("a"), Some(PathBuf::from("/photos/a.MOV")));

        let l = listing(&["b.heic", "b.mov"]);
        assert_eq!(l.find_live_photo("b"), Some(PathBuf::from("/photos/b.mov")));
    }

    #[test]
    fn test_find_live_photo_ignores_other_names() {
        let l = listing(&["c.heic", "c.Mov", "c.mkv", "c.mov.bak", "cc.mov"]);
        assert_eq!(l.find_live_photo("c"), None);
    }

    #[test]
    fn test_find_live_photo_skips_directories() {
        let l = DirListing::from_entries(
            "/photos",
            vec![ListedEntry {
                file_name: "d.mov".into(),
                is_dir: true,
            }],
        );
        assert_eq!(l.find_live_photo("d"), None);
    }

    #[test]
    fn test_read_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("x.heic"), b"x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let l = DirListing::read(dir.path()).unwrap();
        assert_eq!(l.dir(), dir.path());
        assert_eq!(l.entries().len(), 2);
        assert!(l.contains("x.heic"));
        assert!(l.entries().iter().any(|e| e.is_dir && e.name() == Some("sub")));
    }

    #[test]
    fn test_is_converted_in_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(!is_converted_in(&dir.path().join("nope"), "x"));

        fs::write(dir.path().join("x.jpg"), b"x").unwrap();
        assert!(is_converted_in(dir.path(), "x"));
    }
}
