//! Common error types used throughout heicwatch.
//!
//! Covers the failure cases of the filesystem helpers: account lookups,
//! ownership changes, unsupported platforms and plain I/O.

use std::path::PathBuf;

/// Common error type for heicwatch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No account with the given name exists.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The account directory could not be queried.
    #[error("Account lookup failed for {name}: {message}")]
    AccountLookup { name: String, message: String },

    /// Changing the owner of a path failed.
    #[error("Failed to change owner of {}: {message}", path.display())]
    Chown { path: PathBuf, message: String },

    /// The operation is not available on this platform.
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new AccountNotFound error.
    pub fn account_not_found<S: Into<String>>(name: S) -> Self {
        Self::AccountNotFound(name.into())
    }

    /// Create a new AccountLookup error.
    pub fn account_lookup<S: Into<String>, M: Into<String>>(name: S, message: M) -> Self {
        Self::AccountLookup {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a new Chown error.
    pub fn chown<P: Into<PathBuf>, M: Into<String>>(path: P, message: M) -> Self {
        Self::Chown {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new Unsupported error.
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Whether this error means the capability is missing rather than failed.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
