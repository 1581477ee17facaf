//! # heicwatch-convert
//!
//! Invocation of the external image converter.
//!
//! The pixel work is delegated to an external program (ImageMagick's
//! `convert` by default). This crate provides:
//! - The [`Converter`] trait the reconciler drives, one file at a time
//! - [`ConvertCommand`], the subprocess-backed implementation
//! - Tool detection for `check-tools` style diagnostics
//!
//! ## Features
//!
//! - `tracing` - Enable tracing support
//!
//! ## Example
//!
//! ```no_run
//! use heicwatch_convert::{ConvertCommand, Converter};
//! use std::ffi::OsStr;
//! use std::path::Path;
//!
//! let convert = ConvertCommand::discover(None)?;
//! convert.convert(Path::new("/photos"), OsStr::new("IMG.HEIC"), "IMG.jpg")?;
//! # Ok::<(), heicwatch_convert::Error>(())
//! ```

mod convert;
mod error;
pub mod tools;

// Re-exports
pub use convert::{ConvertCommand, Converter};
pub use error::{Error, Result};
pub use tools::{converter_version, DEFAULT_CONVERTER};
