use heicwatch_common::{Error as CommonError, Owner, Ownership};
use heicwatch_convert::{Converter, Error as ConvertError};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Create a file (and its parent directories) with placeholder content.
pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, b"data").unwrap();
}

/// In-process converter: writes the output unless the source name starts
/// with `fail`, which fails like a converter exiting non-zero.
#[derive(Default)]
pub struct FakeConverter {
    calls: Mutex<Vec<(String, String)>>,
    delay: Duration,
    skip_output: bool,
    active: AtomicUsize,
    max_active: AtomicUsize,
    finished: AtomicUsize,
}

impl FakeConverter {
    /// Sleep this long inside every conversion.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report success without writing the output, so every cycle converts
    /// the same files again.
    pub fn without_output(mut self) -> Self {
        self.skip_output = true;
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl Converter for FakeConverter {
    fn convert(&self, dir: &Path, source: &OsStr, output: &str) -> heicwatch_convert::Result<()> {
        let source = source.to_string_lossy().to_string();
        self.calls
            .lock()
            .unwrap()
            .push((source.clone(), output.to_string()));

        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);

        if source.starts_with("fail") {
            return Err(ConvertError::tool_failed("fake", "exit status: 1"));
        }
        if !self.skip_output {
            std::fs::write(dir.join(output), b"jpeg")?;
        }
        Ok(())
    }
}

/// Ownership fake that knows one account and records every change.
#[derive(Default)]
pub struct RecordingOwnership {
    applied: Mutex<Vec<(PathBuf, Owner)>>,
}

impl RecordingOwnership {
    pub const KNOWN_ACCOUNT: &'static str = "photos";
    pub const ACCOUNT_OWNER: Owner = Owner {
        uid: Some(1234),
        gid: Some(5678),
    };
    pub const SOURCE_OWNER: Owner = Owner {
        uid: Some(42),
        gid: Some(43),
    };

    pub fn applied(&self) -> Vec<(PathBuf, Owner)> {
        self.applied.lock().unwrap().clone()
    }
}

impl Ownership for RecordingOwnership {
    fn resolve_account(&self, name: &str) -> heicwatch_common::Result<Owner> {
        if name == Self::KNOWN_ACCOUNT {
            Ok(Self::ACCOUNT_OWNER)
        } else {
            Err(CommonError::account_not_found(name))
        }
    }

    fn owner_of(&self, _path: &Path) -> heicwatch_common::Result<Owner> {
        Ok(Self::SOURCE_OWNER)
    }

    fn apply(&self, path: &Path, owner: &Owner) -> heicwatch_common::Result<()> {
        self.applied
            .lock()
            .unwrap()
            .push((path.to_path_buf(), *owner));
        Ok(())
    }
}
