//! Scan-convert-reconcile cycle.
//!
//! One cycle walks the watch root depth-first. Every HEIC file that has no
//! JPEG next to it (or in its mirrored target directory) is converted, the
//! output is optionally handed to an owner and moved into the target tree,
//! and the live-photo sidecar and original are removed unless retained.
//!
//! Nothing is remembered between cycles: whether a file still needs work is
//! re-derived from directory listings every time.

#[cfg(test)]
pub(crate) mod test_fixtures;

use crate::config::WatchSettings;
use anyhow::{Context, Result};
use heicwatch_common::companion::is_converted_in;
use heicwatch_common::paths::{converted_name, is_legacy_extension, split_file_name};
use heicwatch_common::{DirListing, Owner, Ownership};
use heicwatch_convert::Converter;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    pub relocated: usize,
    pub live_photos_removed: usize,
    pub originals_removed: usize,
}

impl fmt::Display for CycleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} already converted, {} failed, {} moved, {} live photos removed, {} originals removed",
            self.converted,
            self.skipped,
            self.failed,
            self.relocated,
            self.live_photos_removed,
            self.originals_removed
        )
    }
}

/// Applies conversion and retention policy to a watch tree.
pub struct Reconciler {
    settings: WatchSettings,
    converter: Arc<dyn Converter>,
    ownership: Arc<dyn Ownership>,
    dry_run: bool,
}

impl Reconciler {
    pub fn new(
        settings: WatchSettings,
        converter: Arc<dyn Converter>,
        ownership: Arc<dyn Ownership>,
    ) -> Self {
        Self {
            settings,
            converter,
            ownership,
            dry_run: false,
        }
    }

    /// Only log what a cycle would do.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// Run one full cycle over the watch root.
    ///
    /// Per-file failures are logged and counted; only a watch root that is
    /// not a directory fails the cycle.
    pub fn run_cycle(&self) -> Result<CycleSummary> {
        let root = &self.settings.watch_root;
        if !root.is_dir() {
            anyhow::bail!("Watch folder {:?} is not a readable directory", root);
        }

        info!("Start converting in {:?}", root);

        let account = self.resolve_account();
        let mut summary = CycleSummary::default();
        self.walk(root, account.as_ref(), &mut summary)
            .with_context(|| format!("Failed to walk {:?}", root))?;

        info!("Cycle finished: {}", summary);
        Ok(summary)
    }

    /// Owner from the configured account, if any. A failed lookup yields an
    /// owner that changes nothing.
    fn resolve_account(&self) -> Option<Owner> {
        let name = self.settings.owner.as_deref()?;
        match self.ownership.resolve_account(name) {
            Ok(owner) => {
                debug!("Resolved account {} to {}", name, owner);
                Some(owner)
            }
            Err(e) => {
                warn!("Could not resolve account {}: {}; ownership left unchanged", name, e);
                Some(Owner::unchanged())
            }
        }
    }

    fn walk(&self, dir: &Path, account: Option<&Owner>, summary: &mut CycleSummary) -> Result<()> {
        let listing = match DirListing::read(dir) {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Failed to read directory {:?}: {}", dir, e);
                DirListing::empty(dir)
            }
        };

        for entry in listing.entries() {
            if entry.is_dir {
                self.walk(&dir.join(&entry.file_name), account, summary)?;
                continue;
            }

            let Some(name) = entry.name() else {
                let lossy = entry.file_name.to_string_lossy();
                if is_legacy_extension(split_file_name(&lossy).1) {
                    warn!("Skipping {:?} in {:?}: file name is not valid UTF-8", entry.file_name, dir);
                } else {
                    debug!("Skipping non UTF-8 file name {:?} in {:?}", entry.file_name, dir);
                }
                continue;
            };

            let (base, extension) = split_file_name(name);
            if is_legacy_extension(extension) {
                self.process_file(&listing, &entry.file_name, base, account, summary);
            }
        }

        Ok(())
    }

    fn process_file(
        &self,
        listing: &DirListing,
        source_name: &OsStr,
        base: &str,
        account: Option<&Owner>,
        summary: &mut CycleSummary,
    ) {
        let dir = listing.dir();
        let source_path = dir.join(source_name);
        let output_name = converted_name(base);
        let output_path = dir.join(&output_name);
        let destination_dir = self.destination_dir(dir);

        let already_converted = match &destination_dir {
            Some(dest) => is_converted_in(dest, base),
            None => listing.is_already_converted(base),
        };
        if already_converted {
            debug!("Already converted: {:?}", source_path);
            summary.skipped += 1;
            return;
        }

        let owner = self.output_owner(account, &source_path);

        if self.dry_run {
            info!("[DRY RUN] Would convert {:?} to {:?}", source_path, output_path);
            summary.converted += 1;
            return;
        }

        info!("Converting {:?} to {:?}", source_path, output_path);
        if let Err(e) = self.converter.convert(dir, source_name, &output_name) {
            error!("Failed to convert {:?}: {}", source_path, e);
            summary.failed += 1;
            return;
        }
        summary.converted += 1;

        if account.is_some() {
            self.apply_owner(&output_path, &owner);
        }

        if let Some(dest_dir) = destination_dir {
            match self.relocate(&output_path, &dest_dir, &output_name, &owner) {
                Ok(dest) => {
                    info!("Moved {:?} to {:?}", output_path, dest);
                    summary.relocated += 1;
                }
                Err(e) => {
                    // Keep the original and sidecar so the next cycle converts
                    // and moves again.
                    error!("Failed to move {:?} to {:?}: {:#}", output_path, dest_dir, e);
                    summary.failed += 1;
                    return;
                }
            }
        }

        if !self.settings.keep_live_photo {
            if let Some(live_photo) = listing.find_live_photo(base) {
                if remove(&live_photo, "live photo") {
                    summary.live_photos_removed += 1;
                }
            }
        }

        if !self.settings.keep_original && remove(&source_path, "original") {
            summary.originals_removed += 1;
        }
    }

    /// Mirrored directory under the target root, when relocation is enabled.
    fn destination_dir(&self, dir: &Path) -> Option<PathBuf> {
        let target = self.settings.target_root.as_ref()?;
        let relative = dir
            .strip_prefix(&self.settings.watch_root)
            .unwrap_or_else(|_| Path::new(""));
        Some(target.join(relative))
    }

    /// Owner for everything created for one source file.
    fn output_owner(&self, account: Option<&Owner>, source_path: &Path) -> Owner {
        if let Some(owner) = account {
            return *owner;
        }
        if self.settings.target_root.is_none() {
            return Owner::unchanged();
        }

        match self.ownership.owner_of(source_path) {
            Ok(owner) => owner,
            Err(e) if e.is_unsupported() => {
                debug!("Not copying ownership of {:?}: {}", source_path, e);
                Owner::unchanged()
            }
            Err(e) => {
                warn!("Failed to read owner of {:?}: {}", source_path, e);
                Owner::unchanged()
            }
        }
    }

    fn apply_owner(&self, path: &Path, owner: &Owner) {
        if owner.is_unchanged() {
            return;
        }
        match self.ownership.apply(path, owner) {
            Ok(()) => info!("Changed owner of {:?} to {}", path, owner),
            Err(e) => warn!("Failed to change owner of {:?} to {}: {}", path, owner, e),
        }
    }

    fn relocate(
        &self,
        output_path: &Path,
        dest_dir: &Path,
        output_name: &str,
        owner: &Owner,
    ) -> Result<PathBuf> {
        self.create_dirs(dest_dir, owner)?;

        let dest = dest_dir.join(output_name);
        copy_into_place(output_path, &dest)?;
        self.apply_owner(&dest, owner);

        std::fs::remove_file(output_path)
            .with_context(|| format!("Failed to remove {:?} after copying", output_path))?;

        Ok(dest)
    }

    /// Create `dir` and any missing parents, handing each new one to `owner`.
    fn create_dirs(&self, dir: &Path, owner: &Owner) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path.as_os_str().is_empty() || path.exists() {
                break;
            }
            missing.push(path);
            current = path.parent();
        }

        for path in missing.into_iter().rev() {
            match std::fs::create_dir(path) {
                Ok(()) => {
                    debug!("Created directory {:?}", path);
                    self.apply_owner(path, owner);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to create directory {:?}", path))
                }
            }
        }

        Ok(())
    }
}

/// Copy `source` to `dest` through a hidden sibling, so `dest` never exists
/// half-written. The sibling is removed if the copy or rename fails.
fn copy_into_place(source: &Path, dest: &Path) -> Result<()> {
    let partial = partial_path(dest);

    let result = std::fs::copy(source, &partial)
        .with_context(|| format!("Failed to copy {:?} to {:?}", source, partial))
        .and_then(|_| {
            std::fs::rename(&partial, dest)
                .with_context(|| format!("Failed to rename {:?} to {:?}", partial, dest))
        });

    if result.is_err() && partial.exists() {
        if let Err(e) = std::fs::remove_file(&partial) {
            warn!("Failed to remove partial copy {:?}: {}", partial, e);
        }
    }
    result
}

/// `<dir>/.<name>.partial` for `<dir>/<name>`.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(dest.file_name().unwrap_or_default());
    name.push(".partial");
    dest.with_file_name(name)
}

fn remove(path: &Path, what: &str) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed {} {:?}", what, path);
            true
        }
        Err(e) => {
            warn!("Failed to remove {} {:?}: {}", what, path, e);
            false
        }
    }
}
