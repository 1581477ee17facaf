//! heicwatch - periodic HEIC to JPEG conversion for a watched folder tree
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod reconcile;
pub mod watch;
