//! Filesystem abstraction used by the applier.
//!
//! Every mutation of the replica goes through [`FsOps`]. [`LocalFs`] is the
//! real implementation; [`FaultyFs`] wraps it and fails selected paths so that
//! failure isolation can be exercised deterministically.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::{FileTime, set_file_times};

use crate::core::errors::{Result, SyncError};

/// Mutating filesystem operations needed to mirror a tree.
pub trait FsOps: Send + Sync {
    /// Copy `from` over `to`, then carry over access and modification times.
    /// Returns the number of bytes copied.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64>;
    /// Create `path` and any missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// Direct `std::fs` implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FsOps for LocalFs {
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        let bytes = fs::copy(from, to).map_err(|e| SyncError::io("copy", from, e))?;
        let meta = fs::metadata(from).map_err(|e| SyncError::io("inspect", from, e))?;
        let atime = FileTime::from_last_access_time(&meta);
        let mtime = FileTime::from_last_modification_time(&meta);
        set_file_times(to, atime, mtime).map_err(|e| SyncError::io("set times on", to, e))?;
        Ok(bytes)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).map_err(|e| SyncError::io("create directory", path, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| SyncError::io("remove file", path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| SyncError::io("remove directory", path, e))
    }
}

/// [`LocalFs`] with injected failures for chosen paths.
///
/// Any operation whose target (or copy source) matches a registered path fails
/// with the registered error kind and leaves the filesystem untouched.
#[derive(Debug, Clone, Default)]
pub struct FaultyFs {
    inner: LocalFs,
    failures: HashMap<PathBuf, io::ErrorKind>,
}

impl FaultyFs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation touching `path` fail with `kind`.
    #[must_use]
    pub fn fail_on(mut self, path: impl Into<PathBuf>, kind: io::ErrorKind) -> Self {
        self.failures.insert(path.into(), kind);
        self
    }

    fn check(&self, op: &'static str, path: &Path) -> Result<()> {
        match self.failures.get(path) {
            Some(kind) => Err(SyncError::io(
                op,
                path,
                io::Error::new(*kind, "injected failure"),
            )),
            None => Ok(()),
        }
    }
}

impl FsOps for FaultyFs {
    fn copy_file(&self, from: &Path, to: &Path) -> Result<u64> {
        self.check("copy", from)?;
        self.check("copy", to)?;
        self.inner.copy_file(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.check("create directory", path)?;
        self.inner.create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.check("remove file", path)?;
        self.inner.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.check("remove directory", path)?;
        self.inner.remove_dir_all(path)
    }
}
