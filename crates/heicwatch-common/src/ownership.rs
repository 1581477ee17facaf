//! Ownership resolution and propagation.
//!
//! Created files and directories can be handed to a configured account or
//! inherit the owner of the file they were derived from. The platform
//! capability sits behind the [`Ownership`] trait so that platforms without
//! POSIX ownership report [`Error::Unsupported`] instead of pretending a
//! lookup failed.

use crate::{Error, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A user/group pair to apply to a path.
///
/// `None` in either field leaves that part of the ownership untouched, the
/// same as passing `-1` to `chown(2)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Owner {
    pub uid: Option<u32>,
    pub gid: Option<u32>,
}

impl Owner {
    pub fn new(uid: u32, gid: u32) -> Self {
        Self {
            uid: Some(uid),
            gid: Some(gid),
        }
    }

    /// An owner that changes nothing when applied.
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn is_unchanged(&self) -> bool {
        self.uid.is_none() && self.gid.is_none()
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let uid = self.uid.map(i64::from).unwrap_or(-1);
        let gid = self.gid.map(i64::from).unwrap_or(-1);
        write!(f, "uid={uid} gid={gid}")
    }
}

/// Platform capability for reading and changing file ownership.
pub trait Ownership: Send + Sync {
    /// Look up an account by name, returning its uid and primary gid.
    fn resolve_account(&self, name: &str) -> Result<Owner>;

    /// Read the current owner of a path.
    fn owner_of(&self, path: &Path) -> Result<Owner>;

    /// Change the owner of a path. An unchanged owner is a no-op.
    fn apply(&self, path: &Path, owner: &Owner) -> Result<()>;
}

/// Ownership backed by the POSIX account database and `chown(2)`.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PosixOwnership;

#[cfg(unix)]
impl Ownership for PosixOwnership {
    fn resolve_account(&self, name: &str) -> Result<Owner> {
        match nix::unistd::User::from_name(name) {
            Ok(Some(user)) => Ok(Owner::new(user.uid.as_raw(), user.gid.as_raw())),
            Ok(None) => Err(Error::account_not_found(name)),
            Err(errno) => Err(Error::account_lookup(name, errno.desc())),
        }
    }

    fn owner_of(&self, path: &Path) -> Result<Owner> {
        use std::os::unix::fs::MetadataExt;

        let metadata = std::fs::metadata(path)?;
        Ok(Owner::new(metadata.uid(), metadata.gid()))
    }

    fn apply(&self, path: &Path, owner: &Owner) -> Result<()> {
        use nix::unistd::{chown, Gid, Uid};

        if owner.is_unchanged() {
            return Ok(());
        }

        chown(
            path,
            owner.uid.map(Uid::from_raw),
            owner.gid.map(Gid::from_raw),
        )
        .map_err(|errno| Error::chown(path, errno.desc()))
    }
}

/// Ownership on platforms without POSIX owners; every call is unsupported.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedOwnership;

impl Ownership for UnsupportedOwnership {
    fn resolve_account(&self, _name: &str) -> Result<Owner> {
        Err(Error::unsupported("account lookup"))
    }

    fn owner_of(&self, _path: &Path) -> Result<Owner> {
        Err(Error::unsupported("reading file ownership"))
    }

    fn apply(&self, _path: &Path, _owner: &Owner) -> Result<()> {
        Err(Error::unsupported("changing file ownership"))
    }
}

/// The ownership implementation for the current platform.
pub fn system_ownership() -> Arc<dyn Ownership> {
    #[cfg(unix)]
    {
        Arc::new(PosixOwnership)
    }
    #[cfg(not(unix))]
    {
        Arc::new(UnsupportedOwnership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_display_uses_sentinel() {
        assert_eq!(Owner::new(1000, 100).to_string(), "uid=1000 gid=100");
        assert_eq!(Owner::unchanged().to_string(), "uid=-1 gid=-1");
        assert!(Owner::unchanged().is_unchanged());
        assert!(!Owner::new(0, 0).is_unchanged());
    }

    #[test]
    fn test_unsupported_reports_unsupported() {
        let o = UnsupportedOwnership;
        assert!(o.resolve_account("root").unwrap_err().is_unsupported());
        assert!(o.owner_of(Path::new("/")).unwrap_err().is_unsupported());
        assert!(o
            .apply(Path::new("/"), &Owner::unchanged())
            .unwrap_err()
            .is_unsupported());
    }

    #[cfg(unix)]
    mod posix {
        use super::*;
        use std::os::unix::fs::MetadataExt;
        use tempfile::NamedTempFile;

        #[test]
        fn test_owner_of_matches_metadata() {
            let file = NamedTempFile::new().unwrap();
            let meta = std::fs::metadata(file.path()).unwrap();

            let owner = PosixOwnership.owner_of(file.path()).unwrap();
            assert_eq!(owner, Owner::new(meta.uid(), meta.gid()));
        }

        #[test]
        fn test_owner_of_missing_file() {
            let err = PosixOwnership
                .owner_of(Path::new("/nonexistent/heicwatch/file"))
                .unwrap_err();
            assert!(matches!(err, Error::Io(_)));
        }

        #[test]
        fn test_resolve_unknown_account() {
            let err = PosixOwnership
                .resolve_account("heicwatch-no-such-user-12345")
                .unwrap_err();
            assert!(matches!(err, Error::AccountNotFound(_)));
        }

        #[test]
        fn test_apply_unchanged_is_noop() {
            PosixOwnership
                .apply(Path::new("/nonexistent/heicwatch/file"), &Owner::unchanged())
                .unwrap();
        }

        #[test]
        fn test_apply_current_owner() {
            // Re-applying the existing owner is permitted without privileges.
            let file = NamedTempFile::new().unwrap();
            let owner = PosixOwnership.owner_of(file.path()).unwrap();
            PosixOwnership.apply(file.path(), &owner).unwrap();
        }
    }
}
