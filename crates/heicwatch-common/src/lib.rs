//! heicwatch-common: shared building blocks for the reconciler.
//!
//! This crate provides the pieces the tree walker composes per file:
//!
//! - **Name splitting**: turn a file name into `(base, extension)`
//! - **Companion lookup**: detect an existing JPEG output and find the
//!   live-photo sidecar of a still image
//! - **Ownership**: resolve and apply a user/group to created files
//! - **Error handling**: common error type and result alias
//!
//! # Examples
//!
//! ```
//! use heicwatch_common::paths::{converted_name, split_file_name};
//!
//! let (base, ext) = split_file_name("IMG_0001.HEIC");
//! assert_eq!(base, "IMG_0001");
//! assert_eq!(ext, "HEIC");
//! assert_eq!(converted_name(base), "IMG_0001.jpg");
//! ```

pub mod companion;
pub mod error;
pub mod ownership;
pub mod paths;

pub use companion::{DirListing, ListedEntry};
pub use error::{Error, Result};
pub use ownership::{system_ownership, Owner, Ownership};
