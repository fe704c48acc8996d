#![forbid(unsafe_code)]

//! replisync: keeps a replica directory as a one-way mirror of a source
//! directory, re-synchronizing on a fixed interval.
//!
//! Each pass walks the source tree and copies anything new or changed
//! (size differs, or the source is newer), then walks the replica and deletes
//! whatever no longer exists in the source. Per-pass change counts are logged
//! after every pass.
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use replisync::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use replisync::core::config::Config;
//! use replisync::sync::pass::{SyncSession, Synchronizer};
//! ```

pub mod prelude;

pub mod core;
pub mod daemon;
pub mod logger;
pub mod platform;
pub mod sync;
